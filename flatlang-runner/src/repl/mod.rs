mod evaluator;
mod printer;
mod reader;

use rustyline::DefaultEditor;

use evaluator::{Evaluator, LexEvaluator, ParseEvaluator, SessionEvaluator};
use printer::{Printer, ProgramPrinter, SessionPrinter, TokenPrinter};
use reader::{ReadOutput, Reader};

use crate::error::RunnerError;
use crate::Mode;

struct Repl<E: Evaluator, P: Printer> {
    reader: Reader,
    evaluator: E,
    printer: P,
}

impl<O, E: Evaluator<Output = O>, P: Printer<Output = O>> Repl<E, P> {
    fn run(mut self) {
        loop {
            match self.reader.read() {
                ReadOutput::Exit => break,
                ReadOutput::Clear => continue,
                ReadOutput::Value(source) => {
                    let result = self.evaluator.evaluate(&source);
                    self.printer.print(result)
                }
            }
        }
    }
}

pub fn start(mode: Mode) -> Result<(), RunnerError> {
    let reader = Reader::new(DefaultEditor::new()?);

    match mode {
        Mode::Eval => Repl {
            reader,
            evaluator: SessionEvaluator::new()?,
            printer: SessionPrinter {},
        }
        .run(),
        Mode::Parse => Repl {
            reader,
            evaluator: ParseEvaluator {},
            printer: ProgramPrinter {},
        }
        .run(),
        Mode::Lex => Repl {
            reader,
            evaluator: LexEvaluator {},
            printer: TokenPrinter {},
        }
        .run(),
    };
    Ok(())
}
