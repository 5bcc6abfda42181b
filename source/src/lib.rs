#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod diagnostics;
pub mod filesystem;

pub use filesystem::{FileId, FileSystem};
