use std::fmt;

use crate::symbol::Symbol;
use crate::ty::Type;
use source::diagnostics::{ByteIndex, Span};

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Identifies one token instance within a source file. Two tokens share an
/// id only if they cover the same bytes, which cannot happen for distinct
/// tokens of one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenId(usize, usize);

impl Token {
    /// A token that does not come from any source text, such as the names of
    /// the predefined conversion functions.
    pub fn synthesized(kind: TokenKind) -> Token {
        token(kind, Span::new(ByteIndex(0), ByteIndex(0)))
    }

    pub fn ident(name: &str, span: Span) -> Token {
        token(TokenKind::Ident(Symbol::intern(name)), span)
    }

    pub fn is_synthesized(&self) -> bool {
        self.span.start() == ByteIndex(0) && self.span.end() == ByteIndex(0)
    }

    /// The identity of this token, or `None` for synthesized tokens.
    pub fn id(&self) -> Option<TokenId> {
        if self.is_synthesized() {
            None
        } else {
            Some(TokenId(
                self.span.start().to_usize(),
                self.span.end().to_usize(),
            ))
        }
    }

    pub fn is_relop(&self) -> bool {
        use TokenKind::{Equals, GreaterOrEqual, GreaterThan, LessOrEqual, LessThan, NotEquals};
        matches!(
            self.kind,
            Equals | NotEquals | LessThan | LessOrEqual | GreaterThan | GreaterOrEqual
        )
    }

    pub fn is_addop(&self) -> bool {
        matches!(self.kind, TokenKind::Plus | TokenKind::Minus)
    }

    pub fn is_multop(&self) -> bool {
        matches!(self.kind, TokenKind::Mul | TokenKind::Div)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Literal(_))
    }

    /// Tokens that may start a statement.
    pub fn starts_statement(&self) -> bool {
        use Keyword::{Exit, For, If, Loop, Null, Read, Return, While, Write, Writeln};
        match &self.kind {
            TokenKind::Ident(_) => true,
            TokenKind::Reserved(keyword) => matches!(
                keyword,
                Exit | Return | Read | Write | Writeln | Null | If | Loop | For | While
            ),
            _ => false,
        }
    }

    /// Tokens that may start a declaration.
    pub fn starts_declaration(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Ident(_)
                | TokenKind::Reserved(Keyword::Procedure)
                | TokenKind::Reserved(Keyword::Function)
        )
    }

    /// Tokens that may start an expression.
    pub fn starts_expr(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Reserved(Keyword::Not)
                | TokenKind::LParen
                | TokenKind::Ident(_)
                | TokenKind::Literal(_)
                | TokenKind::Plus
                | TokenKind::Minus
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Ident(symbol) => write!(f, "{}", symbol),
            TokenKind::Literal(lit) => write!(f, "{}", lit.symbol),
            kind => write!(f, "{}", kind),
        }
    }
}

#[inline]
pub fn token(kind: TokenKind, span: Span) -> Token {
    Token { kind, span }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /* Literals */
    Literal(Lit),
    /* End of file */
    EOF,
    /* Reserved words such as keywords */
    Reserved(Keyword),
    /* Identifier */
    Ident(Symbol),
    // `:=`
    Becomes,
    // `..`
    Range,
    // `<>`
    NotEquals,
    // `<=`
    LessOrEqual,
    // `>=`
    GreaterOrEqual,
    // `&`, string concatenation
    Ampersand,
    Equals,
    LessThan,
    GreaterThan,
    LParen,
    RParen,
    Colon,
    Semi,
    Comma,
    Dot,
    Plus,
    Minus,
    Mul,
    Div,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let txt = match self {
            Literal(lit) => return write!(f, "{} literal", lit.kind),
            EOF => "end of file",
            Reserved(keyword) => return write!(f, "`{}`", keyword),
            Ident(_) => "identifier",
            Becomes => "`:=`",
            Range => "`..`",
            NotEquals => "`<>`",
            LessOrEqual => "`<=`",
            GreaterOrEqual => "`>=`",
            Ampersand => "`&`",
            Equals => "`=`",
            LessThan => "`<`",
            GreaterThan => "`>`",
            LParen => "`(`",
            RParen => "`)`",
            Colon => "`:`",
            Semi => "`;`",
            Comma => "`,`",
            Dot => "`.`",
            Plus => "`+`",
            Minus => "`-`",
            Mul => "`*`",
            Div => "`/`",
        };
        write!(f, "{}", txt)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Program,
    Is,
    Begin,
    End,
    Constant,
    Integer,
    Real,
    String,
    Boolean,
    Procedure,
    Function,
    Return,
    Ref,
    Value,
    If,
    Then,
    Elsif,
    Else,
    While,
    Loop,
    For,
    In,
    Reverse,
    Exit,
    When,
    Read,
    Write,
    Writeln,
    Null,
    And,
    Or,
    Not,
}

impl Keyword {
    /// Look up a reserved word by its upper-case spelling.
    pub fn from_upper(word: &str) -> Option<Keyword> {
        use Keyword::*;
        let keyword = match word {
            "PROGRAM" => Program,
            "IS" => Is,
            "BEGIN" => Begin,
            "END" => End,
            "CONSTANT" => Constant,
            "INTEGER" => Integer,
            "REAL" => Real,
            "STRING" => String,
            "BOOLEAN" => Boolean,
            "PROCEDURE" => Procedure,
            "FUNCTION" => Function,
            "RETURN" => Return,
            "REF" => Ref,
            "VALUE" => Value,
            "IF" => If,
            "THEN" => Then,
            "ELSIF" => Elsif,
            "ELSE" => Else,
            "WHILE" => While,
            "LOOP" => Loop,
            "FOR" => For,
            "IN" => In,
            "REVERSE" => Reverse,
            "EXIT" => Exit,
            "WHEN" => When,
            "READ" => Read,
            "WRITE" => Write,
            "WRITELN" => Writeln,
            "NULL" => Null,
            "AND" => And,
            "OR" => Or,
            "NOT" => Not,
            _ => return None,
        };
        Some(keyword)
    }

    /// The value type named by a type keyword.
    pub fn as_type(self) -> Option<Type> {
        match self {
            Keyword::Integer => Some(Type::Integer),
            Keyword::Real => Some(Type::Real),
            Keyword::String => Some(Type::Str),
            Keyword::Boolean => Some(Type::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let debug = format!("{:?}", self);
        write!(f, "{}", debug.to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lit {
    pub kind: LitKind,
    pub symbol: Symbol,
}

impl Lit {
    pub fn integer_value(&self) -> Option<i32> {
        match self.kind {
            LitKind::Integer => self.symbol.as_str().parse().ok(),
            _ => None,
        }
    }

    pub fn real_value(&self) -> Option<f32> {
        match self.kind {
            LitKind::Real => self.symbol.as_str().parse().ok(),
            _ => None,
        }
    }

    /// The contents of a string literal: quotes stripped and `""` collapsed to `"`.
    pub fn string_value(&self) -> Option<String> {
        match self.kind {
            LitKind::Str => {
                let source = self.symbol.as_str();
                let inner = source
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
                    .unwrap_or(source);
                Some(inner.replace("\"\"", "\""))
            }
            _ => None,
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.kind {
            LitKind::Bool => Some(self.symbol.as_str().eq_ignore_ascii_case("true")),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LitKind {
    Bool,
    Integer,
    Real,
    Str,
}

impl LitKind {
    /// The value type a literal of this category has.
    pub fn ty(self) -> Type {
        match self {
            LitKind::Bool => Type::Boolean,
            LitKind::Integer => Type::Integer,
            LitKind::Real => Type::Real,
            LitKind::Str => Type::Str,
        }
    }
}

impl fmt::Display for LitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            LitKind::Bool => "boolean",
            LitKind::Integer => "integer",
            LitKind::Real => "real",
            LitKind::Str => "string",
        };
        write!(f, "{}", txt)
    }
}
