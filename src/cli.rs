//!
//! This module is the main entry point for the CLI and orchestrates the core
//! library functions.

use std::{path::PathBuf, process};

use clap::Parser;

use crate::{
    engine::{self, RunRequest, TokenDestination},
    errors::print_error,
    render::OutputOrder,
};

// ============================================================================
// CLI ARGUMENTS - Command-line argument definitions
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "cfgslice",
    version,
    about = "Carve matching subtrees out of network device configurations."
)]
pub struct CfgsliceArgs {
    /// Match expression; repeatable. Segments separated by '||', '|>>|'
    /// selects a whole subtree, '|#|' targets comments.
    #[arg(short = 'm', long = "match", value_name = "EXPR")]
    pub matches: Vec<String>,

    /// Keep comment lines adjacent to matched statements in the output.
    #[arg(short = 'c', long = "with-comments")]
    pub with_comments: bool,

    /// Suppress matched output; the exit code still reports whether
    /// anything matched.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Replace usernames, secrets, AS numbers and addresses with stable
    /// placeholders.
    #[arg(short = 'a', long = "anonymize")]
    pub anonymize: bool,

    /// Emit captured tokens as JSON lines on stdout.
    #[arg(long = "tokens")]
    pub tokens: bool,

    /// Write captured tokens as JSON lines to a file.
    #[arg(long = "tokens-out", value_name = "PATH")]
    pub tokens_out: Option<PathBuf>,

    /// Group output by subtree path instead of source order, with a header
    /// per input file.
    #[arg(long = "sort-by-path")]
    pub sort_by_path: bool,

    /// Input files, directories, or glob patterns.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
///
/// Exit codes: 0 when anything matched, 1 on zero matches, 2 on error.
pub fn run() {
    let args = CfgsliceArgs::parse();

    let token_output = args
        .tokens_out
        .clone()
        .map(TokenDestination::File)
        .or_else(|| args.tokens.then_some(TokenDestination::Stdout));

    let request = RunRequest {
        matches: args.matches,
        with_comments: args.with_comments,
        anonymize: args.anonymize,
        output_order: if args.sort_by_path {
            OutputOrder::PathSorted
        } else {
            OutputOrder::Source
        },
        inputs: args.inputs,
        token_output: token_output.clone(),
    };

    let output = match engine::run(&request) {
        Ok(output) => output,
        Err(error) => {
            print_error(error);
            process::exit(2);
        }
    };

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }

    if !args.quiet {
        print!("{}", output.stdout);
    }

    if matches!(token_output, Some(TokenDestination::Stdout)) {
        for record in &output.tokens {
            match serde_json::to_string(record) {
                Ok(line) => println!("{line}"),
                Err(error) => {
                    eprintln!("error: failed to serialize token record: {error}");
                    process::exit(2);
                }
            }
        }
    }

    if !output.matched {
        process::exit(1);
    }
}
