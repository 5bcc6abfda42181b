use data_structures::scope_map::Referant;
use data_structures::Id;
use syntax::token::{Lit, LitKind, Token, TokenKind};
use syntax::ty::{Kind, Type};

use std::fmt;

pub type EntryId = Id<Entry>;

/// The literal value bound to a constant, tagged by its type.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Integer(i32),
    Real(f32),
    Str(String),
    Bool(bool),
}

impl ConstValue {
    pub fn ty(&self) -> Type {
        match self {
            ConstValue::Integer(_) => Type::Integer,
            ConstValue::Real(_) => Type::Real,
            ConstValue::Str(_) => Type::Str,
            ConstValue::Bool(_) => Type::Boolean,
        }
    }

    /// The value a constant of type `ty` holds when its initializer was rejected.
    pub fn zero(ty: Type) -> Option<ConstValue> {
        match ty {
            Type::Integer => Some(ConstValue::Integer(0)),
            Type::Real => Some(ConstValue::Real(0.0)),
            Type::Str => Some(ConstValue::Str(String::new())),
            Type::Boolean => Some(ConstValue::Bool(false)),
            _ => None,
        }
    }

    pub fn from_lit(lit: &Lit) -> Option<ConstValue> {
        match lit.kind {
            LitKind::Integer => lit.integer_value().map(ConstValue::Integer),
            LitKind::Real => lit.real_value().map(ConstValue::Real),
            LitKind::Str => lit.string_value().map(ConstValue::Str),
            LitKind::Bool => lit.bool_value().map(ConstValue::Bool),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Integer(value) => write!(f, "{}", value),
            ConstValue::Real(value) => write!(f, "{}", value),
            ConstValue::Str(value) => write!(f, "{:?}", value),
            ConstValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

/// The semantic record of one declared name.
///
/// Level and offset are filled in by the `SymbolTable` when the entry is
/// added. After that an entry only changes to receive its constant value,
/// its return type or, for routines, another parameter.
#[derive(Clone, Debug)]
pub struct Entry {
    token: Token,
    ty: Type,
    kind: Kind,
    pub(crate) level: usize,
    pub(crate) offset: usize,
    value: Option<ConstValue>,
    params: Vec<EntryId>,
    return_ty: Type,
}

impl Referant for Entry {}

impl Entry {
    pub fn new(token: Token, ty: Type, kind: Kind) -> Entry {
        Entry {
            token,
            ty,
            kind,
            level: 0,
            offset: 0,
            value: None,
            params: vec![],
            return_ty: Type::Unknown,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The declared name, or an empty string when the originating token
    /// carries no name.
    pub fn name(&self) -> &str {
        match &self.token.kind {
            TokenKind::Ident(symbol) => symbol.as_str(),
            _ => "",
        }
    }

    /// The type an operand naming this entry has: the return type for a
    /// function, the declared type otherwise.
    pub fn effective_ty(&self) -> Type {
        if self.ty == Type::Function {
            self.return_ty
        } else {
            self.ty
        }
    }

    pub fn value(&self) -> Option<&ConstValue> {
        self.value.as_ref()
    }

    pub fn integer_value(&self) -> Option<i32> {
        match self.value {
            Some(ConstValue::Integer(value)) => Some(value),
            _ => None,
        }
    }

    pub fn real_value(&self) -> Option<f32> {
        match self.value {
            Some(ConstValue::Real(value)) => Some(value),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(ConstValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.value {
            Some(ConstValue::Bool(value)) => Some(value),
            _ => None,
        }
    }

    pub fn return_ty(&self) -> Type {
        self.return_ty
    }

    pub fn attach_constant(&mut self, value: ConstValue) {
        self.value = Some(value);
    }

    pub fn fix_return_type(&mut self, ty: Type) {
        debug_assert_eq!(self.ty, Type::Function, "only functions return a value");
        self.return_ty = ty;
    }

    pub fn append_parameter(&mut self, param: EntryId) {
        self.params.push(param);
    }

    /// The `n`th formal parameter, counting from 0.
    pub fn nth_parameter(&self, n: usize) -> Option<EntryId> {
        self.params.get(n).copied()
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn parameters(&self) -> &[EntryId] {
        &self.params
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name())?;
        writeln!(f, "Type: {}", self.ty)?;
        writeln!(f, "Kind: {}", self.kind)?;
        writeln!(f, "Scope: {}", self.level)?;
        write!(f, "Return Type: {}", self.return_ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::diagnostics::{ByteIndex, Span};
    use syntax::symbol::Symbol;

    fn entry(name: &str, ty: Type, kind: Kind) -> Entry {
        Entry::new(
            Token::ident(name, Span::new(ByteIndex(1), ByteIndex(2))),
            ty,
            kind,
        )
    }

    #[test]
    fn name_comes_from_identifier_tokens_only() {
        assert_eq!(entry("COUNT", Type::Integer, Kind::Variable).name(), "COUNT");
        let semi = Entry::new(
            Token::synthesized(TokenKind::Semi),
            Type::Unknown,
            Kind::Unknown,
        );
        assert_eq!(semi.name(), "");
    }

    #[test]
    fn constant_accessors_follow_the_value_tag() {
        let mut limit = entry("LIMIT", Type::Integer, Kind::Constant);
        assert_eq!(limit.value(), None);
        limit.attach_constant(ConstValue::Integer(10));
        assert_eq!(limit.integer_value(), Some(10));
        assert_eq!(limit.real_value(), None);
        assert_eq!(limit.value().map(ConstValue::ty), Some(Type::Integer));
    }

    #[test]
    fn literals_convert_to_constant_values() {
        let lit = Lit {
            kind: LitKind::Str,
            symbol: Symbol::intern("\"a\"\"b\""),
        };
        assert_eq!(
            ConstValue::from_lit(&lit),
            Some(ConstValue::Str(String::from("a\"b")))
        );
        assert_eq!(ConstValue::zero(Type::Real), Some(ConstValue::Real(0.0)));
        assert_eq!(ConstValue::zero(Type::Procedure), None);
    }

    #[test]
    fn effective_type_of_a_function_is_its_return_type() {
        let mut f = entry("F", Type::Function, Kind::Routine);
        assert_eq!(f.effective_ty(), Type::Unknown);
        f.fix_return_type(Type::Real);
        assert_eq!(f.effective_ty(), Type::Real);
        assert_eq!(entry("P", Type::Procedure, Kind::Routine).effective_ty(), Type::Procedure);
    }

    #[test]
    fn display_lists_the_entry_fields() {
        let x = entry("X", Type::Boolean, Kind::RefParam);
        assert_eq!(
            x.to_string(),
            "X:\nType: Boolean\nKind: Reference Parameter\nScope: 0\nReturn Type: Unknown"
        );
    }
}
