#![warn(clippy::all)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
extern crate quickcheck_macros;

pub mod scope_map;

pub use id_arena::{Arena, Id};

pub use fxhash::FxHashMap as HashMap;
pub use fxhash::FxHashSet as HashSet;
