use crate::reader::Reader;

use diagnostics::ParseResult as Result;

use source::diagnostics::{Diagnostic, Label};

use syntax::symbol::Symbol;
use syntax::token::{token, Keyword, Lit, LitKind, Token, TokenKind};

use source::diagnostics::{ByteIndex, Span};

use std::collections::VecDeque;

trait IdentChar {
    fn is_id_start(&self) -> bool;
    fn is_id_continue(&self) -> bool;
    fn is_whitespace(&self) -> bool;
}

impl IdentChar for char {
    fn is_id_start(&self) -> bool {
        use ucd::Codepoint;
        Codepoint::is_id_start(*self)
    }

    fn is_id_continue(&self) -> bool {
        use ucd::Codepoint;
        Codepoint::is_id_continue(*self)
    }

    fn is_whitespace(&self) -> bool {
        use ucd::Codepoint;
        Codepoint::is_whitespace(*self)
    }
}

/// A pull-based scanner for Lille source. Identifiers and keywords are
/// case-insensitive and come out upper-cased.
pub struct Lexer<'a> {
    pub reader: Reader<'a>,
    pub source: &'a str,
    pub lookahead: VecDeque<Token>,
}

fn fatal(message: impl Into<String>, label: &str, span: Span) -> Diagnostic {
    Diagnostic::error()
        .with_message(message)
        .with_labels(vec![Label::primary(span).with_message(label)])
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let reader = Reader::new(source);
        Lexer {
            reader,
            source,
            lookahead: VecDeque::with_capacity(2),
        }
    }

    fn next_char(&mut self) -> Option<char> {
        self.reader.next()
    }

    fn peek_char(&self) -> Option<char> {
        self.reader.peek()
    }

    fn start_span(&self) -> ByteIndex {
        self.reader.start()
    }

    fn end_span(&self, pos: ByteIndex) -> Span {
        self.reader.end(pos)
    }

    fn text(&self, span: Span) -> &'a str {
        &self.source[span.start().to_usize()..span.end().to_usize()]
    }

    fn eat(&mut self, ch: char) {
        let next_ch = self.next_char().expect("eat() called on empty reader");
        debug_assert_eq!(ch, next_ch);
    }

    fn skip_while<F>(&mut self, pred: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                return;
            }
            self.eat(ch);
        }
    }

    /// Skip whitespace and `--` comments.
    fn skip_trivia(&mut self) {
        loop {
            self.skip_while(|ch| IdentChar::is_whitespace(&ch));
            if self.peek_char() == Some('-') && self.reader.peek_second() == Some('-') {
                self.skip_while(|ch| ch != '\n');
            } else {
                return;
            }
        }
    }

    // Read a token containing a single character
    fn punc(&mut self, kind: TokenKind, token_char: char) -> Token {
        let span_start = self.start_span();
        self.eat(token_char);
        let span = self.end_span(span_start);
        token(kind, span)
    }

    // Read `first`, then the second character of whichever pair follows it
    fn punc2(&mut self, first: char, single: TokenKind, pairs: &[(char, TokenKind)]) -> Token {
        let span_start = self.start_span();
        self.eat(first);
        let next = self.peek_char();
        let kind = pairs
            .iter()
            .find(|(ch, _)| Some(*ch) == next)
            .map(|(ch, kind)| (*ch, kind.clone()));
        let kind = match kind {
            Some((ch, kind)) => {
                self.eat(ch);
                kind
            }
            None => single,
        };
        token(kind, self.end_span(span_start))
    }

    fn digits(&mut self) {
        self.skip_while(|ch| ch.is_ascii_digit());
    }

    /**
     * Tokenize a number literal. A `.` followed by a digit makes it a real;
     * a `.` followed by another `.` is left for the range operator.
     */
    fn number(&mut self) -> Result<Token> {
        let span_start = self.start_span();
        self.digits();
        let mut kind = LitKind::Integer;
        if self.peek_char() == Some('.')
            && self.reader.peek_second().map_or(false, |ch| ch.is_ascii_digit())
        {
            kind = LitKind::Real;
            self.eat('.');
            self.digits();
            if let Some(e @ 'E') | Some(e @ 'e') = self.peek_char() {
                let mut lookahead = self.reader.clone();
                lookahead.next();
                let exponent_follows = match lookahead.peek() {
                    Some('+') | Some('-') => lookahead.peek_second(),
                    other => other,
                }
                .map_or(false, |ch| ch.is_ascii_digit());
                if exponent_follows {
                    self.eat(e);
                    if let Some(sign @ '+') | Some(sign @ '-') = self.peek_char() {
                        self.eat(sign);
                    }
                    self.digits();
                }
            }
        }
        let span = self.end_span(span_start);
        let text = self.text(span);
        if kind == LitKind::Integer && text.parse::<i32>().is_err() {
            return Err(fatal(
                "Integer literal is too large",
                &format!("`{}` does not fit in 32 bits", text),
                span,
            ));
        }
        let literal = Lit {
            kind,
            symbol: Symbol::intern(&text.to_uppercase()),
        };
        Ok(token(TokenKind::Literal(literal), span))
    }

    fn eof(&self) -> Token {
        let span_start = self.start_span();
        let span = self.end_span(span_start);
        token(TokenKind::EOF, span)
    }

    /**
     * Parses a single word as either a user-defined identifier,
     * a boolean literal or a reserved word (keyword).
     */
    fn ident(&mut self) -> Token {
        use TokenKind::{Ident, Literal, Reserved};
        let span_start = self.start_span();
        self.skip_while(|ch| ch.is_id_continue());
        let span = self.end_span(span_start);
        let word = self.text(span).to_uppercase();
        let kind = match word.as_str() {
            "TRUE" | "FALSE" => Literal(Lit {
                kind: LitKind::Bool,
                symbol: Symbol::intern(&word),
            }),
            _ => match Keyword::from_upper(&word) {
                Some(keyword) => Reserved(keyword),
                None => Ident(Symbol::intern(&word)),
            },
        };
        token(kind, span)
    }

    /// A double-quoted string; `""` inside it stands for one quote. Strings
    /// may not span lines.
    fn string(&mut self) -> Result<Token> {
        let span_start = self.start_span();
        self.eat('"');
        loop {
            match self.next_char() {
                Some('"') => {
                    if self.peek_char() == Some('"') {
                        self.eat('"');
                    } else {
                        break;
                    }
                }
                Some('\n') | None => {
                    let span = self.end_span(span_start);
                    return Err(fatal(
                        "Unterminated string literal",
                        "string starts here",
                        span,
                    ));
                }
                Some(_) => {}
            }
        }
        let span = self.end_span(span_start);
        let lit = Lit {
            kind: LitKind::Str,
            symbol: Symbol::intern(self.text(span)),
        };
        Ok(token(TokenKind::Literal(lit), span))
    }

    pub fn next_token(&mut self) -> Result<Token> {
        use TokenKind::*;
        // Read from the lookahead if its populated.
        if let Some(token) = self.lookahead.pop_front() {
            return Ok(token);
        }
        self.skip_trivia();
        let token = match self.peek_char() {
            Some(ch) if ch.is_ascii_digit() => return self.number(),
            Some(ch) if ch.is_id_start() => self.ident(),
            Some('"') => return self.string(),
            Some(':') => self.punc2(':', Colon, &[('=', Becomes)]),
            Some('.') => self.punc2('.', Dot, &[('.', Range)]),
            Some('<') => self.punc2('<', LessThan, &[('>', NotEquals), ('=', LessOrEqual)]),
            Some('>') => self.punc2('>', GreaterThan, &[('=', GreaterOrEqual)]),
            Some('=') => self.punc(Equals, '='),
            Some('&') => self.punc(Ampersand, '&'),
            Some('(') => self.punc(LParen, '('),
            Some(')') => self.punc(RParen, ')'),
            Some(';') => self.punc(Semi, ';'),
            Some(',') => self.punc(Comma, ','),
            Some('+') => self.punc(Plus, '+'),
            Some('-') => self.punc(Minus, '-'),
            Some('*') => self.punc(Mul, '*'),
            Some('/') => self.punc(Div, '/'),
            Some(ch) => {
                let span_start = self.start_span();
                self.eat(ch);
                let span = self.end_span(span_start);
                return Err(fatal(
                    "Unexpected character",
                    &format!("`{}` is not part of Lille", ch),
                    span,
                ));
            }
            None => self.eof(),
        };
        Ok(token)
    }

    pub fn peek_token(&mut self) -> Result<&Token> {
        if self.lookahead.is_empty() {
            let token = self.next_token()?;
            self.lookahead.push_front(token);
        }
        Ok(self
            .lookahead
            .front()
            .expect("lookahead holds the token just lexed"))
    }
}
