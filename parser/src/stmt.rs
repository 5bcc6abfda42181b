use crate::parser::{DiagnosticReporting, Parser};

use diagnostics::ErrorCode;
use diagnostics::ParseResult as Result;
use symbol_table::Entry;
use syntax::token::{Keyword, TokenKind};
use syntax::ty::{Kind, Type};

use log::debug;

impl Parser<'_, '_> {
    /// stmt_list ::= statement ";" { statement ";" }
    pub(crate) fn statement_list(&mut self) -> Result<()> {
        loop {
            self.statement()?;
            self.expect(TokenKind::Semi)?;
            if !self.peek()?.starts_statement() {
                return Ok(());
            }
        }
    }

    fn statement(&mut self) -> Result<()> {
        use Keyword::*;
        let token = self.peek()?.clone();
        debug!("statement: {:?}", token.kind);
        match token.kind {
            TokenKind::Ident(_) => self.ident_statement(),
            TokenKind::Reserved(Exit) => self.exit_statement(),
            TokenKind::Reserved(Return) => self.return_statement(),
            TokenKind::Reserved(Read) => self.read_statement(),
            TokenKind::Reserved(Write) | TokenKind::Reserved(Writeln) => self.write_statement(),
            TokenKind::Reserved(Null) => {
                self.next_token()?;
                Ok(())
            }
            TokenKind::Reserved(If) => self.nested(Self::if_statement),
            TokenKind::Reserved(While) => self.nested(Self::while_statement),
            TokenKind::Reserved(For) => self.nested(Self::for_statement),
            TokenKind::Reserved(Loop) => self.nested(Self::loop_statement),
            _ => Err(self.fatal(
                "Expected a statement",
                &format!("{} cannot start a statement", token.kind),
                token.span,
            )),
        }
    }

    /// A call, or an assignment `IDENT := expr`.
    fn ident_statement(&mut self) -> Result<()> {
        let token = self.next_token()?;
        let target = self.resolve(&token)?;
        let entry = self.table.entry(target);
        let (ty, kind) = (entry.ty(), entry.kind());
        if ty == Type::Program {
            self.errors.flag(&token, ErrorCode::ProgramNameAsValue);
        }
        if ty.is_routine() {
            return self.call(target);
        }
        self.expect(TokenKind::Becomes)?;
        if matches!(kind, Kind::LoopVariable | Kind::ValueParam | Kind::Constant) {
            self.errors.flag(&token, ErrorCode::IllegalAssignment);
        }
        self.assignment_expr(target)
    }

    /// "exit" [ "when" operand relop operand ]
    fn exit_statement(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Exit)?;
        if !self.eat_keyword(Keyword::When)? {
            return Ok(());
        }
        self.exit_operand()?;
        let token = self.next_token()?;
        if !token.is_relop() {
            return Err(self.fatal(
                "Expected a relational operator",
                "expected one of `=`, `<>`, `<`, `<=`, `>`, `>=`",
                token.span,
            ));
        }
        self.exit_operand()
    }

    fn exit_operand(&mut self) -> Result<()> {
        let span = self.peek()?.span;
        let ty = self.operand()?;
        if ty == Type::Integer {
            Ok(())
        } else {
            Err(self.fatal(
                "Exit condition must be of integer type",
                &format!("this is {}", ty),
                span,
            ))
        }
    }

    /// "return" [ expr ]
    fn return_statement(&mut self) -> Result<()> {
        let keyword = self.expect_keyword(Keyword::Return)?;
        if !self.peek()?.starts_expr() {
            return Ok(());
        }
        let function = self
            .current_routine
            .filter(|routine| self.entry_ty(*routine) == Type::Function);
        match function {
            Some(function) => {
                let expected = self.table.entry(function).return_ty();
                self.return_expr(expected)
            }
            None => Err(self.fatal(
                "Return with a value outside of a function",
                "only functions can return a value",
                keyword.span,
            )),
        }
    }

    /// "read" [ "(" ] IDENT { "," IDENT } [ ")" ]
    fn read_statement(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Read)?;
        let parenthesised = self.eat(TokenKind::LParen)?;
        loop {
            let token = self.expect_ident()?;
            self.resolve(&token)?;
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        if parenthesised {
            self.expect(TokenKind::RParen)?;
        }
        Ok(())
    }

    /// ( "write" | "writeln" ) [ "(" ] [ item { ( "&" | "," ) item } ] [ ")" ]
    fn write_statement(&mut self) -> Result<()> {
        self.next_token()?;
        let parenthesised = self.eat(TokenKind::LParen)?;
        if self.starts_write_item()? {
            loop {
                self.write_item()?;
                if !(self.eat(TokenKind::Ampersand)? || self.eat(TokenKind::Comma)?) {
                    break;
                }
            }
        }
        if parenthesised {
            self.expect(TokenKind::RParen)?;
        }
        Ok(())
    }

    fn starts_write_item(&mut self) -> Result<bool> {
        let token = self.peek()?;
        Ok(token.is_literal() || matches!(token.kind, TokenKind::Ident(_)))
    }

    fn write_item(&mut self) -> Result<()> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Literal(_) => Ok(()),
            TokenKind::Ident(_) => {
                let item = self.resolve(&token)?;
                if self.entry_ty(item).is_routine() {
                    self.call(item)?;
                }
                Ok(())
            }
            _ => Err(self.fatal(
                "Expected an identifier or literal",
                "cannot be written",
                token.span,
            )),
        }
    }

    /// if ::= "if" cond "then" stmt_list { "elsif" cond "then" stmt_list }
    ///        [ "else" stmt_list ] "end" "if"
    fn if_statement(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::If)?;
        self.condition()?;
        self.expect_keyword(Keyword::Then)?;
        self.statement_list()?;
        while self.eat_keyword(Keyword::Elsif)? {
            self.condition()?;
            self.expect_keyword(Keyword::Then)?;
            self.statement_list()?;
        }
        if self.eat_keyword(Keyword::Else)? {
            self.statement_list()?;
        }
        self.expect_keyword(Keyword::End)?;
        self.expect_keyword(Keyword::If)?;
        Ok(())
    }

    /// loop ::= "loop" stmt_list "end" "loop"
    fn loop_statement(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Loop)?;
        self.statement_list()?;
        self.expect_keyword(Keyword::End)?;
        self.expect_keyword(Keyword::Loop)?;
        Ok(())
    }

    fn while_statement(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::While)?;
        self.condition()?;
        self.loop_statement()
    }

    /// for ::= "for" IDENT "in" [ "reverse" ] bound ".." bound loop
    ///
    /// The bounds are resolved before the loop variable's scope opens.
    fn for_statement(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::For)?;
        let ident = self.expect_ident()?;
        self.expect_keyword(Keyword::In)?;
        self.eat_keyword(Keyword::Reverse)?;
        self.bound()?;
        self.expect(TokenKind::Range)?;
        self.bound()?;
        self.scoped(|parser| {
            parser.declare(Entry::new(ident, Type::Integer, Kind::LoopVariable));
            parser.loop_statement()
        })
    }

    fn bound(&mut self) -> Result<()> {
        let span = self.peek()?.span;
        let ty = self.operand()?;
        if ty == Type::Integer {
            Ok(())
        } else {
            Err(self.fatal(
                "Loop bounds must be of integer type",
                &format!("this is {}", ty),
                span,
            ))
        }
    }
}
