use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

const PROMPT: &str = ">> ";

pub enum ReadOutput {
    Exit,
    Clear,
    Value(String),
}

pub struct Reader {
    rl: Editor<(), DefaultHistory>,
}

/// Terminates a line that does not already end its last statement.
fn complete_statement(line: &str) -> Option<String> {
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        None
    } else if trimmed.ends_with(';') {
        Some(trimmed.to_owned())
    } else {
        Some(format!("{trimmed};"))
    }
}

impl Reader {
    pub fn new(rl: Editor<(), DefaultHistory>) -> Self {
        Self { rl }
    }

    pub fn read(&mut self) -> ReadOutput {
        let readline = self.rl.readline(PROMPT);

        let line = match readline {
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                return ReadOutput::Clear;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                return ReadOutput::Exit;
            }
            Err(err) => {
                eprintln!("error: {err}");
                return ReadOutput::Exit;
            }
            Ok(line) => line,
        };

        if let Err(err) = self.rl.add_history_entry(&line) {
            eprintln!("history: {err}");
        }

        match complete_statement(&line) {
            Some(source) => ReadOutput::Value(source),
            None => ReadOutput::Clear,
        }
    }
}
