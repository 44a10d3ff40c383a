// registry.rs

use std::collections::HashMap;

use tracing::{debug, info_span, warn, Span};

use crate::command::{Command, Context, Flow};
use crate::console::Console;

/// Ordered name -> command mapping. Insertion order is the menu order; a
/// second registration under the same name replaces the command in place.
pub struct Registry {
    entries: Vec<(String, Box<dyn Command>)>,
    index: HashMap<String, usize>,
    span: Span,
}

impl Registry {
    pub fn new(scope: &str) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            span: info_span!("registry", scope = scope),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, command: Box<dyn Command>) {
        let _enter = self.span.enter();
        let name = name.into();
        match self.index.get(&name) {
            Some(&pos) => {
                warn!(name = %name, old = self.entries[pos].1.label(), new = command.label(), "command name already registered, replacing");
                self.entries[pos].1 = command;
            }
            None => {
                debug!(name = %name, label = command.label(), position = self.entries.len(), "command registered");
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, command));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.index.get(name).map(|&pos| self.entries[pos].1.as_ref())
    }

    /// 0-based positional lookup into the menu order.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Command)> {
        self.entries.iter().map(|(name, command)| (name.as_str(), command.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the command bound to `name`. A missing name is reported on the
    /// console and is not an error.
    pub fn execute_by_name(&self, name: &str, console: &mut dyn Console) -> anyhow::Result<Flow> {
        let _enter = self.span.enter();
        match self.get(name) {
            Some(command) => {
                debug!(name, "executing command");
                let mut ctx = Context::new(console, self);
                command.execute(&mut ctx)
            }
            None => {
                warn!(name, "no such command");
                console.println(&format!("No such command: {}", name));
                Ok(Flow::Continue)
            }
        }
    }

    /// Prints `"{n}. {name}"` for every entry, numbered from 1.
    pub fn render(&self, console: &mut dyn Console) {
        for (i, name) in self.names().iter().enumerate() {
            console.println(&format!("{}. {}", i + 1, name));
        }
    }
}
