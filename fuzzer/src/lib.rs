#![warn(clippy::all)]
#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod code_fuzz;

#[cfg(test)]
mod tests {
    use crate::code_fuzz::{CodeFuzzer, FuzzStmtChoice};
    use parser::Parser;
    use source::diagnostics::DiagnosticSet;

    fn parses_cleanly(code: &str) -> bool {
        let mut errors = DiagnosticSet::default();
        let result = Parser::new(code, &mut errors).parse_program();
        match result {
            Ok(()) if errors.is_empty() => true,
            Ok(()) => {
                println!("{}\nunexpected diagnostics: {:?}", code, errors.codes());
                false
            }
            Err(err) => {
                println!("{}\n{}", code, err.message);
                false
            }
        }
    }

    #[test]
    fn restricted_programs_only_assign() {
        let mut fuzz = CodeFuzzer::default();
        fuzz.restrict_stmts(vec![FuzzStmtChoice::Assign]);
        fuzz.gen_program(5);
        let code = fuzz.code();
        assert!(!code.contains(" loop"));
        assert!(!code.contains("if "));
        assert!(parses_cleanly(code));
    }

    #[test]
    fn nested_control_flow_stays_in_bounds() {
        let mut fuzz = CodeFuzzer::default();
        fuzz.restrict_stmts(vec![
            FuzzStmtChoice::If,
            FuzzStmtChoice::While,
            FuzzStmtChoice::Loop,
            FuzzStmtChoice::For,
        ]);
        fuzz.gen_program(3);
        assert!(parses_cleanly(fuzz.code()));
    }

    #[quickcheck]
    fn generates_parseable_code(fuzz: CodeFuzzer) -> bool {
        parses_cleanly(fuzz.code())
    }
}
