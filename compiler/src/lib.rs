#![warn(
    clippy::all,
    clippy::pedantic,
)]
#![allow(clippy::must_use_candidate)]

mod compiler;
mod symbols;

pub use crate::compiler::*;
pub use crate::symbols::SymbolRecord;
