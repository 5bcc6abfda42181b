use crate::symbols::SymbolRecord;

use parser::{Parser, ParserOptions};
use source::diagnostics::{Diagnostic, DiagnosticSet};
use source::filesystem::FileId;
use source::FileSystem;
use symbol_table::SymbolTable;

use std::path::Path;

use log::{debug, error};

/// How `run_from_path` prints the symbol report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// A program that parsed to the end. It may still carry recoverable
/// diagnostics.
#[derive(Debug)]
pub struct Report {
    pub diagnostics: DiagnosticSet,
    pub table: SymbolTable,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Every entry the parse created, builtins and released scopes included,
    /// in declaration order.
    pub fn symbols(&self) -> Vec<SymbolRecord> {
        self.table
            .entries()
            .map(|(_, entry)| SymbolRecord::from(entry))
            .collect()
    }

    pub fn dump_text(&self) -> String {
        self.table
            .entries()
            .map(|(_, entry)| format!("{}\n", entry))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn dump_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.symbols())
    }
}

/// A parse stopped by a fatal error.
#[derive(Debug)]
pub struct Failure {
    /// Recoverable diagnostics reported before the fatal one
    pub diagnostics: DiagnosticSet,
    pub fatal: Diagnostic,
}

impl Failure {
    /// All diagnostics in the order they were produced, the fatal one last.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<_> = self.diagnostics.into_iter().collect();
        diagnostics.push(self.fatal);
        diagnostics
    }
}

/// Lex and parse a single Lille program.
pub fn check_source(source: &str, options: ParserOptions) -> Result<Report, Failure> {
    let mut diagnostics = DiagnosticSet::default();
    let mut parser = Parser::with_options(source, &mut diagnostics, options);
    let result = parser.parse_program();
    let table = parser.into_table();
    match result {
        Ok(()) => Ok(Report { diagnostics, table }),
        Err(fatal) => Err(Failure { diagnostics, fatal }),
    }
}

/// Check a file already loaded into `files`.
pub fn check_file(files: &FileSystem, file: FileId, options: ParserOptions) -> Result<Report, Failure> {
    files.with_source(file, |source| check_source(source, options))
}

/// Render diagnostics for `file` without colors, one after another.
pub fn render_diagnostics(
    files: &FileSystem,
    file: FileId,
    diagnostics: impl IntoIterator<Item = Diagnostic>,
) -> String {
    diagnostics
        .into_iter()
        .filter_map(|diagnostic| diagnostic.for_file(file).render(files).ok())
        .collect()
}

fn emit(files: &FileSystem, file: FileId, diagnostics: impl IntoIterator<Item = Diagnostic>) {
    for diagnostic in diagnostics {
        diagnostic.for_file(file).emit_to_terminal(files);
    }
}

/// Check the program at `path`, writing diagnostics to stderr and, when
/// `dump` is set, the symbol report to stdout. Returns the process exit
/// status: 0 when the program produced no diagnostics, 1 otherwise.
pub fn run_from_path(path: impl AsRef<Path>, options: ParserOptions, dump: Option<OutputFormat>) -> i32 {
    let path = path.as_ref();
    debug!("run_from_path {}", path.display());
    let mut files = FileSystem::new();
    let file = match files.resolve(path) {
        Ok(file) => file,
        Err(diagnostic) => {
            diagnostic.emit_to_terminal(&files);
            return 1;
        }
    };
    match check_file(&files, file, options) {
        Ok(report) => {
            let status = if report.is_clean() { 0 } else { 1 };
            match dump {
                Some(OutputFormat::Text) => print!("{}", report.dump_text()),
                Some(OutputFormat::Json) => match report.dump_json() {
                    Ok(json) => println!("{}", json),
                    Err(err) => {
                        error!("failed to serialize the symbol table: {}", err);
                        return 1;
                    }
                },
                None => {}
            }
            emit(&files, file, report.diagnostics);
            status
        }
        Err(failure) => {
            emit(&files, file, failure.into_diagnostics());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntax::ty::{Kind, Type};

    const CLEAN: &str = "program demo is
    limit : constant integer := 3;
    function twice(n : value integer) return integer is
    begin
        return n * 2;
    end twice;
begin
    write twice(limit);
end demo;
";

    #[test]
    fn clean_programs_report_their_symbols() {
        let report = check_source(CLEAN, ParserOptions::default()).unwrap();
        assert!(report.is_clean());
        let names: Vec<_> = report
            .symbols()
            .into_iter()
            .filter(|record| !record.name.starts_with("__"))
            .map(|record| record.name)
            .collect();
        assert_eq!(
            names,
            vec!["DEMO", "INT2REAL", "REAL2INT", "INT2STRING", "REAL2STRING", "LIMIT", "TWICE", "N"]
        );
        let twice = report
            .symbols()
            .into_iter()
            .find(|record| record.name == "TWICE")
            .unwrap();
        assert_eq!(twice.ty, Type::Function);
        assert_eq!(twice.kind, Kind::Routine);
        assert_eq!(twice.return_type, Some(Type::Integer));
        assert_eq!(twice.level, 1);
    }

    #[test]
    fn failures_keep_earlier_diagnostics() {
        let source = "program demo is
    x : integer;
    x : real;
begin
    x := \"text\";
end demo;
";
        let failure = check_source(source, ParserOptions::default()).unwrap_err();
        assert_eq!(failure.diagnostics.codes(), vec!["E0082"]);
        assert_eq!(failure.fatal.message, "Cannot assign a string value to `X`");
        assert_eq!(failure.into_diagnostics().len(), 2);
    }

    #[test]
    fn text_dump_uses_the_entry_layout() {
        let report = check_source(
            "program p is\n flag : boolean;\nbegin\n null;\nend p;\n",
            ParserOptions::default(),
        )
        .unwrap();
        let dump = report.dump_text();
        assert!(dump.contains("FLAG:\nType: Boolean\nKind: Variable\nScope: 1\nReturn Type: Unknown\n"));
    }

    #[test]
    fn missing_files_fail() {
        assert_eq!(run_from_path("does/not/exist.lil", ParserOptions::default(), None), 1);
    }

    #[test]
    fn rendered_diagnostics_point_into_the_source() {
        let mut files = FileSystem::new();
        let file = files.load("bad.lil", String::from("program p is\nbegin\n y := 1;\nend p;\n"));
        let failure = check_file(&files, file, ParserOptions::default()).unwrap_err();
        let rendered = render_diagnostics(&files, file, failure.into_diagnostics());
        let first = rendered
            .find("error[E0081]: Identifier not previously declared")
            .unwrap();
        let fatal = rendered.find("error: Undeclared identifier `Y`").unwrap();
        assert!(first < fatal);
        assert!(rendered.contains("bad.lil:3:2"));
        assert!(rendered.contains("not declared in any enclosing scope"));
    }
}
