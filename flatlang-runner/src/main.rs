mod error;
mod repl;
mod runner;

use clap::{Parser, ValueEnum};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use error::RunnerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Run statements and their builtins
    Eval,
    /// Print the parsed program
    Parse,
    /// Print the token stream
    Lex,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, value_enum, default_value_t=Mode::Eval)]
    mode: Mode,
    /// Script to run. Starts a REPL when omitted.
    path: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<(), RunnerError> {
    match cli.path {
        None => repl::start(cli.mode),
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .map_err(|source| RunnerError::Read { path, source })?;
            let out = Rc::new(RefCell::new(std::io::stdout()));
            runner::execute(&source, cli.mode, out)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
