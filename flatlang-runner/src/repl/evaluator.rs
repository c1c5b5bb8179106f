use std::cell::RefCell;
use std::rc::Rc;

use flatlang_core::ast::Program;
use flatlang_core::lexer::{Token, Tokenizer};
use flatlang_core::parser::{self, ParseError};
use flatlang_interpreter::object::{EvaluationError, Object};

use crate::error::RunnerError;
use crate::runner;

pub trait Evaluator {
    type Output;

    fn evaluate(&mut self, source: &str) -> Self::Output;
}

/// Keeps one interpreter for the whole session so bindings carry over
/// between lines.
pub struct SessionEvaluator {
    evaluator: flatlang_interpreter::evaluator::Evaluator,
}

impl SessionEvaluator {
    pub fn new() -> Result<Self, EvaluationError> {
        let out = Rc::new(RefCell::new(std::io::stdout()));
        Ok(Self {
            evaluator: runner::session(out)?,
        })
    }
}

impl Evaluator for SessionEvaluator {
    type Output = Result<Vec<Object>, RunnerError>;

    fn evaluate(&mut self, source: &str) -> Self::Output {
        let program = parser::parse(source)?;
        Ok(self.evaluator.eval_program(&program)?)
    }
}

pub struct ParseEvaluator {}

impl Evaluator for ParseEvaluator {
    type Output = Result<Program, ParseError>;

    fn evaluate(&mut self, source: &str) -> Self::Output {
        parser::parse(source)
    }
}

pub struct LexEvaluator {}

impl Evaluator for LexEvaluator {
    type Output = Vec<Token>;

    fn evaluate(&mut self, source: &str) -> Self::Output {
        Tokenizer::with_comments(source).collect()
    }
}
