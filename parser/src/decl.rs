use crate::parser::{DiagnosticReporting, Parser};

use diagnostics::ErrorCode;
use diagnostics::ParseResult as Result;
use symbol_table::{ConstValue, Entry, EntryId};
use syntax::token::{Keyword, Token, TokenKind};
use syntax::ty::{Kind, Type};

use log::debug;

impl Parser<'_, '_> {
    /// declaration ::= ident_list ":" [ "constant" ] type [ ":=" literal ] ";"
    ///               | "procedure" IDENT [ params ] "is" block ";"
    ///               | "function" IDENT [ params ] "return" type "is" block ";"
    pub(crate) fn declaration(&mut self) -> Result<()> {
        match self.peek_kind()? {
            TokenKind::Reserved(Keyword::Procedure) => self.routine(Type::Procedure),
            TokenKind::Reserved(Keyword::Function) => self.routine(Type::Function),
            _ => self.variables(),
        }
    }

    /// ident_list ::= IDENT { "," IDENT }
    pub(crate) fn ident_list(&mut self) -> Result<Vec<Token>> {
        let mut idents = vec![self.expect_ident()?];
        while self.eat(TokenKind::Comma)? {
            idents.push(self.expect_ident()?);
        }
        Ok(idents)
    }

    fn variables(&mut self) -> Result<()> {
        debug!("variables");
        let idents = self.ident_list()?;
        self.expect(TokenKind::Colon)?;
        let is_constant = self.eat_keyword(Keyword::Constant)?;
        let ty = self.ty()?;
        let initializer = if is_constant {
            self.expect(TokenKind::Becomes)?;
            Some(self.initializer(ty)?)
        } else if self.eat(TokenKind::Becomes)? {
            // Checked like a constant's, but variables never store it
            self.initializer(ty)?;
            None
        } else {
            None
        };
        let kind = if is_constant {
            Kind::Constant
        } else {
            Kind::Variable
        };
        for ident in idents {
            let id = self.declare(Entry::new(ident, ty, kind));
            if let Some(value) = &initializer {
                self.table.entry_mut(id).attach_constant(value.clone());
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    /// The literal after `:=`. A literal of the wrong category is flagged and
    /// replaced by the zero value of `ty`.
    fn initializer(&mut self, ty: Type) -> Result<ConstValue> {
        let token = self.next_token()?;
        let lit = match &token.kind {
            TokenKind::Literal(lit) => lit,
            _ => {
                return Err(self.fatal(
                    "Expected a literal",
                    "initializers must be literal values",
                    token.span,
                ))
            }
        };
        if lit.kind.ty() != ty {
            self.errors.flag(&token, ErrorCode::ConstantTypeMismatch);
            return ConstValue::zero(ty)
                .ok_or_else(|| self.fatal("Expected a type", "not a value type", token.span));
        }
        ConstValue::from_lit(lit)
            .ok_or_else(|| self.fatal("Invalid literal", "cannot be read as a value", token.span))
    }

    fn routine(&mut self, ty: Type) -> Result<()> {
        debug!("routine {}", ty);
        self.next_token()?;
        let name = self.expect_ident()?;
        let routine = self.declare(Entry::new(name, ty, Kind::Routine));
        let enclosing = self.current_routine.replace(routine);
        let result = self.scoped(|parser| {
            parser.params(routine)?;
            if ty == Type::Function {
                parser.expect_keyword(Keyword::Return)?;
                let return_ty = parser.ty()?;
                parser.table.entry_mut(routine).fix_return_type(return_ty);
            }
            parser.expect_keyword(Keyword::Is)?;
            parser.block()
        });
        self.current_routine = enclosing;
        result?;
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    /// params ::= "(" param { ";" param } ")"
    /// param  ::= ident_list ":" ( "ref" | "value" ) type
    fn params(&mut self, routine: EntryId) -> Result<()> {
        if !self.eat(TokenKind::LParen)? {
            return Ok(());
        }
        loop {
            let idents = self.ident_list()?;
            self.expect(TokenKind::Colon)?;
            let token = self.next_token()?;
            let kind = match token.kind {
                TokenKind::Reserved(Keyword::Ref) => Kind::RefParam,
                TokenKind::Reserved(Keyword::Value) => Kind::ValueParam,
                _ => {
                    return Err(self.fatal(
                        "Expected `ref` or `value`",
                        "every parameter must say how it is passed",
                        token.span,
                    ))
                }
            };
            let ty = self.ty()?;
            for ident in idents {
                let param = self.declare(Entry::new(ident, ty, kind));
                self.table.entry_mut(routine).append_parameter(param);
            }
            if !self.eat(TokenKind::Semi)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(())
    }
}
