use clap::Parser;
use compiler::OutputFormat;
use parser::{ParserOptions, DEFAULT_MAX_NESTING};
use symbol_table::DEFAULT_MAX_DEPTH;

use std::path::PathBuf;
use std::process;

/// Check a Lille program: parse it, build its symbol table and report
/// every diagnostic.
#[derive(Parser, Debug)]
#[command(name = "lillec", version, long_about = None)]
struct Args {
    /// The Lille source file
    file: PathBuf,

    /// How many scopes, the global one included, may be open at once
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// How many compound statements and nested calls may be open at once
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING)]
    max_nesting: usize,

    /// Log every symbol table operation
    #[arg(long)]
    trace: bool,

    /// Print the symbol table after a successful parse
    #[arg(long)]
    dump_symbols: bool,

    /// Format of the symbol dump
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() {
    let args = Args::parse();

    let filter = if args.trace { "info" } else { "warn" };
    env_logger::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let options = ParserOptions {
        max_scope_depth: args.max_depth,
        max_nesting: args.max_nesting,
        trace: args.trace,
    };
    let dump = if args.dump_symbols {
        Some(args.format)
    } else {
        None
    };
    process::exit(compiler::run_from_path(&args.file, options, dump));
}
