#![warn(clippy::all)]

pub mod symbol;
pub mod token;
pub mod ty;
