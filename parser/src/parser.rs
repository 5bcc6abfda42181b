// renaming this Tokenizer for now because I'm tired of the word Lexer...
use lexer::Lexer as Tokenizer;
use symbol_table::{Entry, EntryId, SymbolTable, DEFAULT_MAX_DEPTH};
use syntax::symbol::Symbol;
use syntax::token::{Keyword, Token, TokenKind};
use syntax::ty::{Kind, Type};

use crate::sink::ErrorSink;

use diagnostics::ErrorCode;
use diagnostics::ParseResult as Result;

use source::diagnostics::{ByteIndex, Diagnostic, Label, Span};

use log::debug;

/// The predefined conversion functions: name, return type, parameter type.
const BUILTINS: [(&str, Type, Type); 4] = [
    ("INT2REAL", Type::Real, Type::Integer),
    ("REAL2INT", Type::Integer, Type::Real),
    ("INT2STRING", Type::Str, Type::Integer),
    ("REAL2STRING", Type::Str, Type::Real),
];

/// How deeply statements and calls may nest unless configured otherwise.
pub const DEFAULT_MAX_NESTING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// How many scopes, the global one included, may be open at once.
    pub max_scope_depth: usize,
    /// How many compound statements and nested calls may be open at once.
    pub max_nesting: usize,
    /// Log every symbol table operation at `info` instead of `debug`.
    pub trace: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_scope_depth: DEFAULT_MAX_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
            trace: false,
        }
    }
}

pub struct Parser<'s, 'e> {
    /// The tokenizer/lexer for this Parser instance
    tokenizer: Tokenizer<'s>,
    /// The span of the last consumed token
    pub(crate) span: Span,
    pub(crate) table: SymbolTable,
    pub(crate) errors: &'e mut dyn ErrorSink,
    /// The procedure or function whose body is being parsed
    pub(crate) current_routine: Option<EntryId>,
    /// Compound statements and nested calls currently open
    nesting: usize,
    max_nesting: usize,
}

pub(crate) trait DiagnosticReporting {
    fn fatal(&self, message: &str, label: &str, span: Span) -> Diagnostic;
}

impl DiagnosticReporting for Parser<'_, '_> {
    fn fatal(&self, message: &str, label_message: &str, span: Span) -> Diagnostic {
        let label = Label::primary(span).with_message(label_message);
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![label])
    }
}

impl<'s, 'e> Parser<'s, 'e> {
    pub fn new(source: &'s str, errors: &'e mut dyn ErrorSink) -> Self {
        Parser::with_options(source, errors, ParserOptions::default())
    }

    pub fn with_options(
        source: &'s str,
        errors: &'e mut dyn ErrorSink,
        options: ParserOptions,
    ) -> Self {
        debug!("Parser::new {:?}", options);
        let tokenizer = Tokenizer::new(source);
        let mut table = SymbolTable::new(options.max_scope_depth);
        table.set_trace(options.trace);
        Parser {
            tokenizer,
            // Start with a dummy span
            span: Span::new(ByteIndex(0), ByteIndex(0)),
            table,
            errors,
            current_routine: None,
            nesting: 0,
            max_nesting: options.max_nesting,
        }
    }
}

impl Parser<'_, '_> {
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn into_table(self) -> SymbolTable {
        self.table
    }

    /// Returns the next token from the tokenizer.
    pub(crate) fn next_token(&mut self) -> Result<Token> {
        let token = self.tokenizer.next_token()?;
        debug!("next_token: {:?}", token.kind);
        self.span = token.span;
        Ok(token)
    }

    pub(crate) fn peek(&mut self) -> Result<&Token> {
        self.tokenizer.peek_token()
    }

    pub(crate) fn peek_kind(&mut self) -> Result<TokenKind> {
        Ok(self.peek()?.kind.clone())
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<bool> {
        if self.peek()?.kind == kind {
            self.expect(kind)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> Result<bool> {
        self.eat(TokenKind::Reserved(keyword))
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        debug!("expect {:?}", kind);
        let prev_span = self.span;
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(&token, &kind.to_string(), prev_span))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token> {
        self.expect(TokenKind::Reserved(keyword))
    }

    pub(crate) fn expect_ident(&mut self) -> Result<Token> {
        let prev_span = self.span;
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Ident(_) => Ok(token),
            _ => Err(self.unexpected(&token, "an identifier", prev_span)),
        }
    }

    fn unexpected(&self, found: &Token, expected: &str, prev_span: Span) -> Diagnostic {
        Diagnostic::error()
            .with_message(format!("Expected {} but found {}", expected, found.kind))
            .with_labels(vec![
                Label::primary(found.span).with_message("unexpected token"),
                Label::secondary(prev_span).with_message(format!("expected {} after this", expected)),
            ])
    }

    /// Parse a type keyword.
    pub(crate) fn ty(&mut self) -> Result<Type> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Reserved(keyword) => keyword.as_type(),
            _ => None,
        }
        .ok_or_else(|| {
            self.fatal(
                "Expected a type",
                "expected `integer`, `real`, `string` or `boolean`",
                token.span,
            )
        })
    }

    /// Run `production` inside a fresh scope. The scope is exited before
    /// returning, whether or not the production succeeded.
    pub(crate) fn scoped<T>(&mut self, production: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if let Err(overflow) = self.table.enter_scope() {
            return Err(self.fatal("Nesting too deep", &overflow.to_string(), self.span));
        }
        let result = production(self);
        self.table.exit_scope();
        result
    }

    /// Run `production` one nesting level deeper. Parsing stops with a
    /// fatal error before the parser recurses past `max_nesting`.
    pub(crate) fn nested<T>(&mut self, production: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= self.max_nesting {
            let label = format!(
                "statements and calls may not nest more than {} deep",
                self.max_nesting
            );
            return Err(self.fatal("Nesting too deep", &label, self.span));
        }
        self.nesting += 1;
        let result = production(self);
        self.nesting -= 1;
        result
    }

    /// Resolve a referenced identifier. Undeclared names are flagged and
    /// end the parse.
    pub(crate) fn resolve(&mut self, token: &Token) -> Result<EntryId> {
        let name = match &token.kind {
            TokenKind::Ident(symbol) => symbol.as_str(),
            _ => "",
        };
        match self.table.lookup(name) {
            Some(id) => Ok(id),
            None => {
                self.errors.flag(token, ErrorCode::Undeclared);
                Err(self.fatal(
                    &format!("Undeclared identifier `{}`", name),
                    "not declared in any enclosing scope",
                    token.span,
                ))
            }
        }
    }

    /// Insert a declaration into the current scope. A name already declared
    /// in this scope is flagged and the new entry is returned unbound.
    pub(crate) fn declare(&mut self, entry: Entry) -> EntryId {
        let token = entry.token().clone();
        match self.table.add_entry(entry) {
            Ok(id) => id,
            Err(redeclared) => {
                self.errors.flag(&token, ErrorCode::Redeclared);
                redeclared.entry
            }
        }
    }

    pub(crate) fn entry_ty(&self, id: EntryId) -> Type {
        self.table.entry(id).ty()
    }

    /// program ::= "program" IDENT "is" block ";" EOF
    pub fn parse_program(&mut self) -> Result<()> {
        debug!("parse_program");
        self.expect_keyword(Keyword::Program)?;
        let name = self.expect_ident()?;
        self.declare(Entry::new(name, Type::Program, Kind::Routine));
        self.define_builtins();
        self.expect_keyword(Keyword::Is)?;
        self.block()?;
        self.expect(TokenKind::Semi)?;
        self.expect(TokenKind::EOF)?;
        self.table.dump(true);
        Ok(())
    }

    fn define_builtins(&mut self) {
        for (name, return_ty, param_ty) in &BUILTINS {
            let token = Token::synthesized(TokenKind::Ident(Symbol::intern(name)));
            let mut function = Entry::new(token, Type::Function, Kind::Routine);
            function.fix_return_type(*return_ty);
            let arg = Token::synthesized(TokenKind::Ident(Symbol::intern(&format!(
                "__{}_arg__",
                name
            ))));
            let param = self.table.alloc(Entry::new(arg, *param_ty, Kind::ValueParam));
            function.append_parameter(param);
            if self.table.add_entry(function).is_err() {
                debug!("{} is shadowed by the program name", name);
            }
        }
    }

    /// block ::= { declaration } "begin" stmt_list "end" [ IDENT ]
    pub(crate) fn block(&mut self) -> Result<()> {
        debug!("block");
        self.scoped(|parser| {
            while parser.peek()?.starts_declaration() {
                parser.declaration()?;
            }
            parser.expect_keyword(Keyword::Begin)?;
            parser.statement_list()?;
            parser.expect_keyword(Keyword::End)?;
            if let TokenKind::Ident(_) = parser.peek_kind()? {
                parser.next_token()?;
            }
            Ok(())
        })
    }
}
