use crate::filesystem::{FileId, FileSystem};
pub use codespan::{ByteIndex, Span};
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
pub use codespan_reporting::term::*;
use std::io;
use std::ops::Range;

// These diagnostic interfaces implement the same API as the codespan_reporting crate, except
// Label, which does not require a FileId when instantiated.

#[derive(Default, Debug)]
pub struct DiagnosticSet {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSet {
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// The codes of every collected diagnostic, in the order they were reported.
    pub fn codes(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter_map(|diagnostic| diagnostic.code())
            .collect()
    }

    pub fn for_file(self, file: FileId) -> Self {
        DiagnosticSet {
            diagnostics: self
                .diagnostics
                .into_iter()
                .map(|diagnostic| diagnostic.for_file(file))
                .collect(),
        }
    }
}

impl IntoIterator for DiagnosticSet {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub labels: Vec<Label>,
    code: Option<String>,
    severity: Severity,
}

impl Diagnostic {
    fn into_codespan(self) -> CodespanDiagnostic<FileId> {
        let mut diagnostic = CodespanDiagnostic::new(self.severity)
            .with_message(self.message)
            .with_labels(
                self.labels
                    .into_iter()
                    .filter_map(|label| {
                        // Labels that were never attached to a file can't be rendered
                        let file = label.file?;
                        Some(
                            CodespanLabel::new(label.style, file, label.range)
                                .with_message(label.message),
                        )
                    })
                    .collect(),
            );
        if let Some(code) = self.code {
            diagnostic = diagnostic.with_code(code);
        }
        diagnostic
    }

    pub fn emit_to_terminal(self, files: &FileSystem) {
        use termcolor::{ColorChoice, StandardStream};
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = Config::default();
        let diagnostic = self.into_codespan();
        let mut lock = writer.lock();
        if let Err(err) = emit(&mut lock, &config, files, &diagnostic) {
            eprintln!("failed to emit diagnostic: {}", err);
        }
    }

    /// Render the diagnostic without colors, the way it would appear on a terminal.
    pub fn render(self, files: &FileSystem) -> io::Result<String> {
        use termcolor::NoColor;
        let mut writer = NoColor::new(Vec::new());
        let config = Config::default();
        let diagnostic = self.into_codespan();
        emit(&mut writer, &config, files, &diagnostic)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    pub fn error() -> Diagnostic {
        Diagnostic {
            message: String::new(),
            labels: vec![],
            code: None,
            severity: Severity::Error,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_labels(mut self, labels: impl Into<Vec<Label>>) -> Self {
        self.labels = labels.into();
        self
    }

    pub fn for_file(mut self, file: FileId) -> Self {
        for label in &mut self.labels {
            if label.file.is_none() {
                label.file = Some(file);
            }
        }
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The byte range of the first primary label, if there is one.
    pub fn primary_range(&self) -> Option<Range<usize>> {
        self.labels
            .iter()
            .find(|label| label.style == LabelStyle::Primary)
            .map(|label| label.range.clone())
    }
}

#[derive(Clone, Debug)]
pub struct Label {
    pub file: Option<FileId>,
    pub style: LabelStyle,
    pub range: Range<usize>,
    pub message: String,
}

impl Label {
    pub fn primary(range: impl Into<Range<usize>>) -> Label {
        Label {
            file: None,
            style: LabelStyle::Primary,
            range: range.into(),
            message: String::new(),
        }
    }

    pub fn secondary(range: impl Into<Range<usize>>) -> Label {
        Label {
            file: None,
            style: LabelStyle::Secondary,
            range: range.into(),
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn for_file(mut self, file: FileId) -> Self {
        self.file = Some(file);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_file_only_fills_missing_files() {
        let mut files = FileSystem::new();
        let first = files.load("a.lil", String::from("program a is"));
        let second = files.load("b.lil", String::from("program b is"));
        let diagnostic = Diagnostic::error().with_labels(vec![
            Label::primary(0..7),
            Label::secondary(8..9).for_file(second),
        ]);
        let diagnostic = diagnostic.for_file(first);
        assert_eq!(diagnostic.labels[0].file, Some(first));
        assert_eq!(diagnostic.labels[1].file, Some(second));
    }

    #[test]
    fn codes_skip_uncoded_diagnostics() {
        let mut set = DiagnosticSet::default();
        set.add(Diagnostic::error().with_code("E0081"));
        set.add(Diagnostic::error().with_message("no code"));
        set.add(Diagnostic::error().with_code("E0121"));
        assert_eq!(set.codes(), vec!["E0081", "E0121"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn render_includes_code_message_and_label() {
        let mut files = FileSystem::new();
        let file = files.load("main.lil", String::from("x := 1;\n"));
        let diagnostic = Diagnostic::error()
            .with_message("Identifier not previously declared")
            .with_code("E0081")
            .with_labels(vec![Label::primary(Span::new(ByteIndex(0), ByteIndex(1))).with_message("unknown")])
            .for_file(file);
        let rendered = diagnostic.render(&files).unwrap();
        assert!(rendered.contains("error[E0081]: Identifier not previously declared"));
        assert!(rendered.contains("main.lil"));
        assert!(rendered.contains("unknown"));
    }

    #[test]
    fn emit_to_terminal_writes_file_and_unattached_labels() {
        let mut files = FileSystem::new();
        let file = files.load("main.lil", String::from("x := 1;\n"));
        Diagnostic::error()
            .with_message("Identifier not previously declared")
            .with_labels(vec![Label::primary(0..1)])
            .for_file(file)
            .emit_to_terminal(&files);
        Diagnostic::error()
            .with_message("Cannot read missing.lil")
            .emit_to_terminal(&files);
    }
}
