#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

mod decl;
mod expr;
mod parser;
mod sink;
mod stmt;

pub use crate::parser::*;
pub use crate::sink::ErrorSink;
