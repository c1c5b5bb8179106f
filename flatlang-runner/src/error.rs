use std::path::PathBuf;

use flatlang_core::parser::ParseError;
use flatlang_interpreter::object::EvaluationError;
use rustyline::error::ReadlineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line editor: {0}")]
    Readline(#[from] ReadlineError),
}
