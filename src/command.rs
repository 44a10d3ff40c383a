// command.rs

use crate::console::Console;
use crate::registry::Registry;

/// What the dispatcher should do after a command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Everything a command can touch while it runs: the terminal and the
/// registry it was dispatched from.
pub struct Context<'a> {
    pub console: &'a mut dyn Console,
    pub registry: &'a Registry,
}

impl<'a> Context<'a> {
    pub fn new(console: &'a mut dyn Console, registry: &'a Registry) -> Self {
        Self { console, registry }
    }

    pub fn println(&mut self, line: &str) {
        self.console.println(line);
    }
}

pub trait Command {
    /// Display name, e.g. `Add` or `Greet`.
    fn label(&self) -> &str;

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow>;
}
