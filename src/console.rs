// console.rs

use std::collections::VecDeque;

use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use thiserror::Error;

use crate::util::writeln_ignore_broken_pipe;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("input interrupted")]
    Interrupted,
    #[error("end of input")]
    Eof,
    #[error("line editor failure: {0}")]
    Editor(ReadlineError),
}

impl ConsoleError {
    /// True for the conditions that end the session cleanly.
    pub fn is_termination(&self) -> bool {
        matches!(self, ConsoleError::Interrupted | ConsoleError::Eof)
    }
}

/// Returns true if anywhere in the chain the user interrupted or closed input.
pub fn is_termination(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ConsoleError>())
        .any(ConsoleError::is_termination)
}

/// Line-oriented terminal I/O used by every command.
pub trait Console {
    /// Shows `prompt` and returns the entered line without its newline.
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError>;

    fn println(&mut self, line: &str);
}

pub struct TerminalConsole {
    editor: DefaultEditor,
}

impl TerminalConsole {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::builder().auto_add_history(true).build();
        let editor = DefaultEditor::with_config(config)?;
        Ok(Self { editor })
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) => Err(ConsoleError::Interrupted),
            Err(ReadlineError::Eof) => Err(ConsoleError::Eof),
            Err(err) => Err(ConsoleError::Editor(err)),
        }
    }

    fn println(&mut self, line: &str) {
        let _ = writeln_ignore_broken_pipe(std::io::stdout(), line);
    }
}

/// Console fed from a fixed list of input lines. Prompts and printed lines
/// are captured in order; once the inputs run out every read reports `Eof`.
/// A queued interrupt (`None`) reads as Ctrl-C.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<Option<String>>,
    output: String,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(|line| Some(line.into())).collect(),
            output: String::new(),
        }
    }

    /// Queues a Ctrl-C after the inputs given so far.
    pub fn then_interrupt(mut self) -> Self {
        self.inputs.push_back(None);
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.output.push_str(prompt);
        match self.inputs.pop_front() {
            Some(Some(line)) => {
                self.output.push_str(&line);
                self.output.push('\n');
                Ok(line)
            }
            Some(None) => {
                self.output.push_str("^C\n");
                Err(ConsoleError::Interrupted)
            }
            None => Err(ConsoleError::Eof),
        }
    }

    fn println(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}
