use serde::{Deserialize, Serialize};

use std::fmt;

/// The value category of a declared name or of an expression operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Real,
    #[serde(rename = "String")]
    Str,
    Boolean,
    Procedure,
    Function,
    Program,
    Unknown,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Integer | Type::Real)
    }

    /// Procedures and functions, the entries that can be called.
    pub fn is_routine(self) -> bool {
        matches!(self, Type::Procedure | Type::Function)
    }
}

impl Default for Type {
    fn default() -> Self {
        Type::Unknown
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            Type::Integer => "Integer",
            Type::Real => "Real",
            Type::Str => "String",
            Type::Boolean => "Boolean",
            Type::Procedure => "Procedure",
            Type::Function => "Function",
            Type::Program => "Program",
            Type::Unknown => "Unknown",
        };
        write!(f, "{}", txt)
    }
}

/// How a name was declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Variable,
    Constant,
    ValueParam,
    RefParam,
    /// The induction variable of a `for` loop
    LoopVariable,
    Routine,
    Unknown,
}

impl Kind {
    /// Whether entries of this kind occupy a storage slot in their scope.
    pub fn has_storage(self) -> bool {
        matches!(
            self,
            Kind::Variable | Kind::ValueParam | Kind::RefParam | Kind::LoopVariable
        )
    }
}

impl Default for Kind {
    fn default() -> Self {
        Kind::Unknown
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            Kind::Variable => "Variable",
            Kind::Constant => "Constant",
            Kind::ValueParam => "Value Parameter",
            Kind::RefParam => "Reference Parameter",
            Kind::LoopVariable => "Loop Variable",
            Kind::Routine => "Routine",
            Kind::Unknown => "Unknown",
        };
        write!(f, "{}", txt)
    }
}
