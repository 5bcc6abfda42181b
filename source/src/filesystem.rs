pub use codespan_reporting::files::{Files, SimpleFile};

use crate::diagnostics::Diagnostic;

use std::fmt::{self, Display};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;

pub type Result<T> = std::result::Result<T, Diagnostic>;

#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub struct FileId(usize);

#[derive(Debug, Clone)]
pub struct FileName(PathBuf);

impl Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

type File = SimpleFile<FileName, String>;

/// In-memory store for the source text of every file the driver has read,
/// so diagnostics can be rendered against it afterwards.
#[derive(Default)]
pub struct FileSystem {
    files: Vec<File>,
    ids: FxHashMap<PathBuf, FileId>,
}

impl FileSystem {
    pub fn new() -> Self {
        FileSystem::default()
    }

    pub fn id_for_path(&self, path: &Path) -> Option<FileId> {
        self.ids.get(path).copied()
    }

    fn get(&self, id: FileId) -> Option<&File> {
        self.files.get(id.0)
    }

    /// Register `text` as the contents of `path`, replacing anything already loaded for it.
    pub fn load(&mut self, path: impl Into<PathBuf>, text: String) -> FileId {
        let path = path.into();
        let file = File::new(FileName(path.clone()), text);
        if let Some(id) = self.id_for_path(&path) {
            self.files[id.0] = file;
            return id;
        }
        let id = FileId(self.files.len());
        self.files.push(file);
        self.ids.insert(path, id);
        id
    }

    /// Read `path` from disk unless it was loaded before.
    pub fn resolve(&mut self, path: &Path) -> Result<FileId> {
        if let Some(id) = self.id_for_path(path) {
            return Ok(id);
        }
        match fs::read_to_string(path) {
            Ok(source) => Ok(self.load(path, source)),
            Err(os_err) => Err(Diagnostic::error()
                .with_message(format!("Cannot read {}: {}", path.display(), os_err))),
        }
    }

    pub fn with_source<F, T, E>(&self, id: FileId, func: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&str) -> std::result::Result<T, E>,
    {
        let file = self.get(id).expect("Expect a source for a FileId");
        func(file.source())
    }
}

impl<'a> Files<'a> for FileSystem {
    type FileId = FileId;
    type Name = FileName;
    type Source = &'a str;

    fn name(&'a self, id: FileId) -> Option<Self::Name> {
        self.get(id).map(|file| file.name().clone())
    }

    fn source(&'a self, id: FileId) -> Option<Self::Source> {
        self.get(id).map(|file| file.source().as_str())
    }

    fn line_index(&'a self, id: FileId, byte_index: usize) -> Option<usize> {
        self.get(id)?.line_index((), byte_index)
    }

    fn line_range(&'a self, id: FileId, line_index: usize) -> Option<Range<usize>> {
        self.get(id)?.line_range((), line_index)
    }
}
