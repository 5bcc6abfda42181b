use source::diagnostics::{Diagnostic, Label, Span};

use std::fmt;

/// Numbered, recoverable semantic errors. Flagging one of these never
/// stops the parse; fatal conditions are returned as a `Diagnostic` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// 81
    Undeclared,
    /// 82
    Redeclared,
    /// 85
    IllegalAssignment,
    /// 91
    ProgramNameAsValue,
    /// 96
    LoopVariableArgument,
    /// 98
    ValueParamAsReference,
    /// 111
    ConstantTypeMismatch,
    /// 121
    TypeMismatch,
    /// 123
    FunctionAsReference,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::Undeclared,
        ErrorCode::Redeclared,
        ErrorCode::IllegalAssignment,
        ErrorCode::ProgramNameAsValue,
        ErrorCode::LoopVariableArgument,
        ErrorCode::ValueParamAsReference,
        ErrorCode::ConstantTypeMismatch,
        ErrorCode::TypeMismatch,
        ErrorCode::FunctionAsReference,
    ];

    pub fn number(self) -> u16 {
        match self {
            ErrorCode::Undeclared => 81,
            ErrorCode::Redeclared => 82,
            ErrorCode::IllegalAssignment => 85,
            ErrorCode::ProgramNameAsValue => 91,
            ErrorCode::LoopVariableArgument => 96,
            ErrorCode::ValueParamAsReference => 98,
            ErrorCode::ConstantTypeMismatch => 111,
            ErrorCode::TypeMismatch => 121,
            ErrorCode::FunctionAsReference => 123,
        }
    }

    pub fn from_number(number: u16) -> Option<ErrorCode> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.number() == number)
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Undeclared => "Identifier not previously declared",
            ErrorCode::Redeclared => "Identifier already declared in this scope",
            ErrorCode::IllegalAssignment => {
                "Cannot assign to a loop variable, value parameter or constant"
            }
            ErrorCode::ProgramNameAsValue => "Program name cannot be used as a value",
            ErrorCode::LoopVariableArgument => {
                "Loop variable cannot be passed as a reference parameter"
            }
            ErrorCode::ValueParamAsReference => {
                "Value parameter cannot be passed as a reference parameter"
            }
            ErrorCode::ConstantTypeMismatch => "Constant value does not match its declared type",
            ErrorCode::TypeMismatch => "Identifier type does not match",
            ErrorCode::FunctionAsReference => {
                "Function result cannot be passed as a reference parameter"
            }
        }
    }

    /// The diagnostic reported when this code is flagged at `span`.
    pub fn diagnostic(self, span: Span) -> Diagnostic {
        Diagnostic::error()
            .with_message(self.message())
            .with_code(self.to_string())
            .with_labels(vec![Label::primary(span)])
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.number())
    }
}
