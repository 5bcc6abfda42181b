use diagnostics::ErrorCode;
use source::diagnostics::DiagnosticSet;
use syntax::token::Token;

/// Receives recoverable semantic errors. Flagging never stops the parse.
pub trait ErrorSink {
    fn flag(&mut self, token: &Token, code: ErrorCode);
}

impl ErrorSink for DiagnosticSet {
    fn flag(&mut self, token: &Token, code: ErrorCode) {
        self.add(code.diagnostic(token.span));
    }
}

/// Keeps only the codes, in the order they were flagged.
impl ErrorSink for Vec<ErrorCode> {
    fn flag(&mut self, _token: &Token, code: ErrorCode) {
        self.push(code);
    }
}
