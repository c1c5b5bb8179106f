use flatlang_core::ast::Program;
use flatlang_core::lexer::Token;
use flatlang_core::parser::ParseError;
use flatlang_interpreter::object::Object;

use crate::error::RunnerError;

pub trait Printer {
    type Output;

    fn print(&mut self, output: Self::Output);
}

pub struct SessionPrinter {}

impl Printer for SessionPrinter {
    type Output = Result<Vec<Object>, RunnerError>;

    fn print(&mut self, output: Self::Output) {
        match output {
            Ok(results) => results
                .iter()
                .filter(|result| **result != Object::Unit)
                .for_each(|result| println!("{result}")),
            Err(err) => eprintln!("{err}"),
        }
    }
}

pub struct ProgramPrinter {}

impl Printer for ProgramPrinter {
    type Output = Result<Program, ParseError>;

    fn print(&mut self, output: Self::Output) {
        match output {
            Ok(program) => print!("{program}"),
            Err(err) => eprintln!("parse error: {err}"),
        }
    }
}

pub struct TokenPrinter {}

impl Printer for TokenPrinter {
    type Output = Vec<Token>;

    fn print(&mut self, output: Self::Output) {
        for token in output {
            println!("{token}");
        }
    }
}
