use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use aocla::{parser, Interp, Repl};

/// A tiny stack-based, concatenative programming language with first-class
/// code.
#[derive(ClapParser, Debug)]
#[command(name = "aocla", version, about)]
struct Cli {
    /// Source file to run. Omit to start the REPL.
    file: Option<PathBuf>,

    /// Extra values pushed onto the stack (in order) before the file runs.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let mut interp = Interp::new();

    match cli.file {
        Some(path) => run_file(&mut interp, &path, &cli.args),
        None => {
            if let Err(e) = Repl::new(interp).run() {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

fn run_file(interp: &mut Interp, path: &PathBuf, extra_args: &[String]) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            println!("Runtime error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for arg in extra_args {
        match parser::Parser::new(arg).parse_value() {
            Ok(v) => interp.stack.push(v),
            Err(e) => {
                println!("Runtime error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let program = match parser::parse_program(&source) {
        Ok(p) => p,
        Err(e) => {
            println!("Runtime error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match aocla::vm::eval(interp, &program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Runtime error: {e}");
            ExitCode::FAILURE
        }
    }
}
