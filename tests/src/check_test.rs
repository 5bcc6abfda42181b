use compiler::{check_file, check_source, render_diagnostics};
use parser::ParserOptions;
use source::FileSystem;
use syntax::ty::Kind;

use insta::{assert_snapshot, glob};
use std::fs;

/// What a fixture declares about itself in its leading comments:
/// `-- expect: E0082 E0111` and `-- fatal: <message>`.
#[derive(Debug, Default, PartialEq)]
struct Expectation {
    codes: Vec<String>,
    fatal: Option<String>,
}

impl Expectation {
    fn declared_in(source: &str) -> Expectation {
        let mut expectation = Expectation::default();
        for line in source.lines() {
            if let Some(codes) = line.strip_prefix("-- expect:") {
                expectation
                    .codes
                    .extend(codes.split_whitespace().map(String::from));
            } else if let Some(message) = line.strip_prefix("-- fatal:") {
                expectation.fatal = Some(message.trim().to_string());
            }
        }
        expectation
    }

    fn observed(source: &str) -> Expectation {
        match check_source(source, ParserOptions::default()) {
            Ok(report) => Expectation {
                codes: report.diagnostics.codes().into_iter().map(String::from).collect(),
                fatal: None,
            },
            Err(failure) => Expectation {
                codes: failure.diagnostics.codes().into_iter().map(String::from).collect(),
                fatal: Some(failure.fatal.message),
            },
        }
    }
}

#[test]
// Every fixture states its own expected diagnostics, so adding a case is
// just adding a file.
fn fixtures_report_what_they_declare() {
    glob!("fixtures/*.lil", |path| {
        let source = fs::read_to_string(path).unwrap();
        assert_eq!(
            Expectation::observed(&source),
            Expectation::declared_in(&source),
            "{}",
            path.display()
        );
    });
}

fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src/fixtures")
        .join(name);
    fs::read_to_string(path).unwrap()
}

#[test]
fn shadowed_names_keep_their_own_levels() {
    let report = check_source(&fixture("nested.lil"), ParserOptions::default()).unwrap();
    let depths: Vec<_> = report
        .symbols()
        .into_iter()
        .filter(|record| record.name == "DEPTH")
        .map(|record| (record.level, record.kind))
        .collect();
    assert_eq!(
        depths,
        vec![(1, Kind::Variable), (3, Kind::Variable), (2, Kind::LoopVariable)]
    );
}

#[test]
fn json_dump_lists_every_entry() {
    let report = check_source(&fixture("ledger.lil"), ParserOptions::default()).unwrap();
    let json = report.dump_json().unwrap();
    assert!(json.contains("\"name\": \"INTEREST\""));
    assert!(json.contains("\"return_type\": \"Real\""));
    assert!(json.contains("\"value\": \"\\\"Savings\\\"\""));
    assert!(json.contains("\"kind\": \"LoopVariable\""));
}

#[test]
fn a_smaller_depth_limit_rejects_nested_routines() {
    let options = ParserOptions {
        max_scope_depth: 3,
        ..ParserOptions::default()
    };
    let failure = check_source(&fixture("nested.lil"), options).unwrap_err();
    assert_snapshot!(failure.fatal.message, @"Nesting too deep");
    assert!(failure.diagnostics.is_empty());
}

#[test]
fn tracing_does_not_change_the_outcome() {
    let options = ParserOptions {
        trace: true,
        ..ParserOptions::default()
    };
    let traced = check_source(&fixture("reference_arguments.lil"), options).unwrap();
    assert_snapshot!(traced.diagnostics.codes().join(", "), @"E0098, E0096, E0123");
}

#[test]
fn rendered_fatal_error_names_the_location() {
    let mut files = FileSystem::new();
    let file = files.load("undeclared.lil", fixture("undeclared.lil"));
    let failure = check_file(&files, file, ParserOptions::default()).unwrap_err();
    let rendered = render_diagnostics(&files, file, failure.into_diagnostics());
    assert!(rendered.contains("error[E0081]: Identifier not previously declared"));
    assert!(rendered.contains("undeclared.lil:5:5"));
    assert!(rendered.contains("error: Undeclared identifier `MISSING`"));
}
