use data_structures::scope_map::Reference;
use serde::{Deserialize, Serialize};

use std::borrow::Borrow;
use std::fmt::{self, Debug, Display, Formatter};

/// An identifier or literal spelling. Lille is case-insensitive, so the
/// lexer interns identifiers in their upper-case form.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    // Temporary representation, we will eventually intern the string
    // with a global interner like rustc, but for now this helps debugging
    unstable_source: String,
}

impl Reference for Symbol {}

impl Symbol {
    pub fn intern(s: &str) -> Symbol {
        Symbol {
            unstable_source: String::from(s),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.unstable_source
    }
}

/// Lets ordered maps keyed by `Symbol` be queried with a plain `&str`.
impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.unstable_source
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unstable_source)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unstable_source)
    }
}
