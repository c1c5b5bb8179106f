use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use flatlang_core::lexer::Tokenizer;
use flatlang_core::parser;
use flatlang_interpreter::builtins;
use flatlang_interpreter::evaluator::Evaluator;
use flatlang_interpreter::object::EvaluationError;

use crate::error::RunnerError;
use crate::Mode;

/// An evaluator with the prelude builtins writing to `out`.
pub fn session<W: Write + 'static>(out: Rc<RefCell<W>>) -> Result<Evaluator, EvaluationError> {
    let mut evaluator = Evaluator::new();
    for (name, builtin) in builtins::prelude(out) {
        evaluator.register_builtin(name, builtin)?;
    }
    Ok(evaluator)
}

/// Processes a whole script once.
pub fn execute<W: Write + 'static>(
    source: &str,
    mode: Mode,
    out: Rc<RefCell<W>>,
) -> Result<(), RunnerError> {
    match mode {
        Mode::Eval => {
            let program = parser::parse(source)?;
            session(out)?.eval_program(&program)?;
        }
        Mode::Parse => {
            let program = parser::parse(source)?;
            write!(out.borrow_mut(), "{program}")?;
        }
        Mode::Lex => {
            let mut out = out.borrow_mut();
            for token in Tokenizer::with_comments(source) {
                writeln!(out, "{token}")?;
            }
        }
    }
    Ok(())
}
