use serde::Serialize;
use symbol_table::Entry;
use syntax::ty::{Kind, Type};

/// One row of the symbol report, the shape written by `--format json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub kind: Kind,
    pub level: usize,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl From<&Entry> for SymbolRecord {
    fn from(entry: &Entry) -> Self {
        SymbolRecord {
            name: entry.name().to_string(),
            ty: entry.ty(),
            kind: entry.kind(),
            level: entry.level(),
            offset: entry.offset(),
            return_type: if entry.ty() == Type::Function {
                Some(entry.return_ty())
            } else {
                None
            },
            value: entry.value().map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::diagnostics::{ByteIndex, Span};
    use symbol_table::ConstValue;
    use syntax::token::Token;

    fn entry(name: &str, ty: Type, kind: Kind) -> Entry {
        Entry::new(
            Token::ident(name, Span::new(ByteIndex(0), ByteIndex(1))),
            ty,
            kind,
        )
    }

    #[test]
    fn constants_carry_their_value() {
        let mut limit = entry("LIMIT", Type::Integer, Kind::Constant);
        limit.attach_constant(ConstValue::Integer(10));
        let record = SymbolRecord::from(&limit);
        assert_eq!(record.value.as_deref(), Some("10"));
        assert_eq!(record.return_type, None);
    }

    #[test]
    fn functions_report_their_return_type() {
        let mut half = entry("HALF", Type::Function, Kind::Routine);
        half.fix_return_type(Type::Real);
        let json = serde_json::to_string(&SymbolRecord::from(&half)).unwrap();
        assert_eq!(
            json,
            r#"{"name":"HALF","type":"Function","kind":"Routine","level":0,"offset":0,"return_type":"Real"}"#
        );
    }
}
