#![warn(
    clippy::all,
    clippy::pedantic,
)]
#![allow(clippy::must_use_candidate)]

mod entry;
mod table;

pub use entry::{ConstValue, Entry, EntryId};
pub use table::{Redeclared, SymbolTable};

pub use data_structures::scope_map::{ScopeOverflow, DEFAULT_MAX_DEPTH};
