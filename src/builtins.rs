// builtins.rs

use tracing::{error, info, warn};

use crate::calculator;
use crate::command::{Command, Context, Flow};
use crate::console::is_termination;
use crate::plugin::{Catalog, CommandDescriptor, PluginContext, PluginEntry};
use crate::util::{capitalize, parse_integer};

/// Top-level plugins compiled into the binary. `menu` is not listed: it is
/// wired by the application once everything else has loaded.
static PLUGINS: &[PluginEntry] = &[
    PluginEntry {
        name: "calculator",
        commands: &[CommandDescriptor { label: "Calculator", build: calculator::build }],
    },
    PluginEntry {
        name: "exit",
        commands: &[CommandDescriptor { label: "Exit", build: build_exit }],
    },
    PluginEntry {
        name: "greet",
        commands: &[CommandDescriptor { label: "Greet", build: build_greet }],
    },
];

pub fn catalog() -> Catalog {
    Catalog::new(PLUGINS)
}

fn build_greet(_: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(GreetCommand))
}

fn build_exit(_: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(ExitCommand))
}

pub struct GreetCommand;

impl Command for GreetCommand {
    fn label(&self) -> &str {
        "Greet"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        info!("Hello, World!");
        ctx.println("Hello, World!");
        Ok(Flow::Continue)
    }
}

pub struct ExitCommand;

impl Command for ExitCommand {
    fn label(&self) -> &str {
        "Exit"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        info!("exit command executed, application is exiting");
        ctx.println("Exiting...");
        Ok(Flow::Exit(0))
    }
}

/// Lists every command of the registry it runs in, itself included, and
/// runs one selection.
pub struct MenuCommand;

impl Command for MenuCommand {
    fn label(&self) -> &str {
        "Menu"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        let registry = ctx.registry;
        ctx.println("\nMain Menu:");
        for (i, name) in registry.names().iter().enumerate() {
            ctx.println(&format!("{}. {}", i + 1, capitalize(name)));
        }
        ctx.println("Enter the number of the command to execute, or '0' to exit.");

        let input = ctx.console.read_line("Selection: ")?;
        let selection = match parse_integer(input.trim()) {
            Some(n) => n,
            None => {
                warn!(input = %input.trim(), "non-numeric menu selection");
                ctx.println("Invalid selection. Please enter a valid number.");
                return Ok(Flow::Continue);
            }
        };
        if selection == 0 {
            info!("user selected to exit the program");
            ctx.println("Exiting program.");
            return Ok(Flow::Exit(0));
        }
        let name = match selection.checked_sub(1).and_then(|i| usize::try_from(i).ok()).and_then(|i| registry.name_at(i)) {
            Some(name) => name,
            None => {
                warn!(selection, "menu selection out of range");
                ctx.println("Invalid selection. Please enter a valid number.");
                return Ok(Flow::Continue);
            }
        };
        info!(command = name, "user selected command");
        match registry.execute_by_name(name, &mut *ctx.console) {
            Ok(flow) => Ok(flow),
            Err(err) if is_termination(&err) => Err(err),
            Err(err) => {
                error!(command = name, "unexpected error: {:#}", err);
                ctx.println("An unexpected error occurred. Please try again.");
                Ok(Flow::Continue)
            }
        }
    }
}
