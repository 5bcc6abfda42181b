use crate::parser::{DiagnosticReporting, Parser};

use diagnostics::ErrorCode;
use diagnostics::ParseResult as Result;
use symbol_table::EntryId;
use syntax::token::{Keyword, Lit, LitKind, Token, TokenKind};
use syntax::ty::{Kind, Type};

use log::debug;

/// The type of a literal token, `Unknown` for anything else.
pub(crate) fn get_type(token: &Token) -> Type {
    match &token.kind {
        TokenKind::Literal(Lit { kind, .. }) => kind.ty(),
        _ => Type::Unknown,
    }
}

impl Parser<'_, '_> {
    /// An identifier, function call or literal. Returns its effective type.
    pub(crate) fn operand(&mut self) -> Result<Type> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Ident(_) => {
                let id = self.value_ident(&token)?;
                let entry = self.table.entry(id);
                let ty = entry.effective_ty();
                if entry.ty().is_routine() {
                    self.call(id)?;
                }
                Ok(ty)
            }
            TokenKind::Literal(_) => Ok(get_type(&token)),
            _ => Err(self.fatal(
                "Expected an identifier or literal",
                &format!("found {}", token.kind),
                token.span,
            )),
        }
    }

    /// Resolve an identifier used as a value. The program name is flagged.
    fn value_ident(&mut self, token: &Token) -> Result<EntryId> {
        let id = self.resolve(token)?;
        if self.entry_ty(id) == Type::Program {
            self.errors.flag(token, ErrorCode::ProgramNameAsValue);
        }
        Ok(id)
    }

    /// cond ::= relation { ( "and" | "or" ) relation }
    ///
    /// A relation compares two operands of the same effective type, or is a
    /// single boolean operand.
    pub(crate) fn condition(&mut self) -> Result<()> {
        debug!("condition");
        loop {
            let span = self.peek()?.span;
            let first = self.operand()?;
            if self.peek()?.is_relop() {
                self.next_token()?;
                let second_span = self.peek()?.span;
                let second = self.operand()?;
                if first != second {
                    return Err(self.fatal(
                        &format!("Cannot compare {} with {}", first, second),
                        &format!("this is {}", second),
                        second_span,
                    ));
                }
            } else if first != Type::Boolean {
                return Err(self.fatal(
                    "Condition must be boolean",
                    &format!("this is {}", first),
                    span,
                ));
            }
            if !(self.eat_keyword(Keyword::And)? || self.eat_keyword(Keyword::Or)?) {
                return Ok(());
            }
        }
    }

    /// Check the argument list of a call to `callee`, whose name was just
    /// consumed. Arguments bind to the formals by position.
    pub(crate) fn call(&mut self, callee: EntryId) -> Result<()> {
        self.nested(|parser| parser.call_arguments(callee))
    }

    fn call_arguments(&mut self, callee: EntryId) -> Result<()> {
        let name = self.table.entry(callee).name().to_string();
        let count = self.table.entry(callee).parameter_count();
        debug!("call {} with {} parameters", name, count);
        let parenthesised = self.eat(TokenKind::LParen)?;
        if count > 0 && !parenthesised {
            let token = self.peek()?.clone();
            return Err(self.fatal(
                &format!("Expected arguments for `{}`", name),
                &format!("`{}` takes {} parameters", name, count),
                token.span,
            ));
        }
        for position in 0..count {
            if position > 0 && !self.eat(TokenKind::Comma)? {
                return Err(self.too_few_arguments(&name, count));
            }
            let formal = match self.table.entry(callee).nth_parameter(position) {
                Some(formal) => self.table.entry(formal),
                None => break,
            };
            let (formal_ty, formal_kind) = (formal.ty(), formal.kind());
            let token = self.peek()?.clone();
            let actual = match token.kind {
                TokenKind::Ident(_) => self.identifier_argument(formal_kind)?,
                TokenKind::Literal(_) => {
                    self.next_token()?;
                    get_type(&token)
                }
                _ => return Err(self.too_few_arguments(&name, count)),
            };
            if actual != formal_ty {
                return Err(self.fatal(
                    &format!("Argument does not match parameter type in call to `{}`", name),
                    &format!("expected {} but this is {}", formal_ty, actual),
                    token.span,
                ));
            }
        }
        if parenthesised {
            self.expect(TokenKind::RParen)?;
        }
        Ok(())
    }

    fn identifier_argument(&mut self, formal_kind: Kind) -> Result<Type> {
        let token = self.next_token()?;
        let id = self.value_ident(&token)?;
        let entry = self.table.entry(id);
        let (ty, kind, effective) = (entry.ty(), entry.kind(), entry.effective_ty());
        if formal_kind == Kind::RefParam {
            match kind {
                Kind::LoopVariable => self.errors.flag(&token, ErrorCode::LoopVariableArgument),
                Kind::ValueParam => self.errors.flag(&token, ErrorCode::ValueParamAsReference),
                _ if ty == Type::Function => {
                    self.errors.flag(&token, ErrorCode::FunctionAsReference)
                }
                _ => {}
            }
        }
        if ty.is_routine() {
            self.call(id)?;
        }
        Ok(effective)
    }

    fn too_few_arguments(&mut self, name: &str, count: usize) -> source::diagnostics::Diagnostic {
        let span = self
            .peek()
            .map(|token| token.span)
            .unwrap_or(self.span);
        self.fatal(
            &format!("Too few arguments in call to `{}`", name),
            &format!("`{}` takes {} parameters", name, count),
            span,
        )
    }

    /// The right-hand side of an assignment: a flat run of terms, each
    /// checked against the declared type of `target`.
    pub(crate) fn assignment_expr(&mut self, target: EntryId) -> Result<()> {
        let target_entry = self.table.entry(target);
        let target_ty = target_entry.ty();
        let target_name = target_entry.name().to_string();
        debug!("assignment to {}: {}", target_name, target_ty);
        let mut terms = 0;
        loop {
            let token = self.peek()?.clone();
            let required = match &token.kind {
                TokenKind::LParen | TokenKind::RParen => None,
                TokenKind::Reserved(Keyword::Not) => Some((Type::Boolean, "operator `not`")),
                TokenKind::Ident(_) => {
                    self.next_token()?;
                    let id = self.value_ident(&token)?;
                    let entry = self.table.entry(id);
                    let is_routine = entry.ty().is_routine();
                    if entry.effective_ty() != target_ty {
                        self.errors.flag(&token, ErrorCode::TypeMismatch);
                    }
                    if is_routine {
                        self.call(id)?;
                    }
                    terms += 1;
                    continue;
                }
                TokenKind::Literal(lit) => {
                    let required = match lit.kind {
                        LitKind::Integer | LitKind::Real => (lit.kind.ty(), "this number"),
                        LitKind::Bool => (Type::Boolean, "a boolean value"),
                        LitKind::Str => (Type::Str, "a string value"),
                    };
                    terms += 1;
                    Some(required)
                }
                TokenKind::Plus | TokenKind::Minus | TokenKind::Mul | TokenKind::Div => {
                    if !target_ty.is_numeric() {
                        return Err(self.fatal(
                            &format!("Cannot do arithmetic on a {} value", target_ty),
                            &format!("`{}` is {}", target_name, target_ty),
                            token.span,
                        ));
                    }
                    None
                }
                TokenKind::Ampersand => Some((Type::Str, "operator `&`")),
                _ if token.is_relop() => Some((Type::Boolean, "a comparison")),
                _ => break,
            };
            if let Some((ty, what)) = required {
                if ty != target_ty {
                    return Err(self.fatal(
                        &format!("Cannot assign {} to `{}`", what, target_name),
                        &format!("`{}` is {}", target_name, target_ty),
                        token.span,
                    ));
                }
            }
            self.next_token()?;
        }
        if terms == 0 {
            let token = self.peek()?.clone();
            return Err(self.fatal(
                "Expected an expression",
                &format!("found {}", token.kind),
                token.span,
            ));
        }
        Ok(())
    }

    /// The value of a `return`, checked term by term against the function's
    /// return type.
    pub(crate) fn return_expr(&mut self, expected: Type) -> Result<()> {
        loop {
            while self.eat(TokenKind::LParen)? {}
            let prefix = self.peek()?;
            if prefix.is_addop() || prefix.kind == TokenKind::Reserved(Keyword::Not) {
                self.return_operator(expected)?;
            }
            let token = self.next_token()?;
            let given = match token.kind {
                TokenKind::Ident(_) => {
                    let id = self.value_ident(&token)?;
                    let entry = self.table.entry(id);
                    let given = entry.effective_ty();
                    if entry.ty().is_routine() {
                        self.call(id)?;
                    }
                    given
                }
                TokenKind::Literal(_) => get_type(&token),
                _ => {
                    return Err(self.fatal(
                        "Expected an identifier or literal",
                        &format!("found {}", token.kind),
                        token.span,
                    ))
                }
            };
            if given != expected {
                return Err(self.fatal(
                    &format!("Function returns {} but was given {}", expected, given),
                    &format!("this is {}", given),
                    token.span,
                ));
            }
            while self.eat(TokenKind::RParen)? {}
            let next = self.peek()?;
            if next.is_addop() || next.is_multop() || next.kind == TokenKind::Ampersand {
                self.return_operator(expected)?;
            } else {
                return Ok(());
            }
        }
    }

    fn return_operator(&mut self, expected: Type) -> Result<()> {
        let token = self.next_token()?;
        let allowed = match token.kind {
            TokenKind::Ampersand => expected == Type::Str,
            TokenKind::Reserved(Keyword::Not) => expected == Type::Boolean,
            _ => expected.is_numeric(),
        };
        if allowed {
            Ok(())
        } else {
            Err(self.fatal(
                &format!("Operator {} cannot produce a {} value", token.kind, expected),
                "in this return value",
                token.span,
            ))
        }
    }
}
