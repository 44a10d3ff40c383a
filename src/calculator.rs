// calculator.rs

use tracing::{error, info, info_span, warn, Span};

use crate::command::{Command, Context, Flow};
use crate::config::Config;
use crate::console::is_termination;
use crate::operations;
use crate::plugin::{Loader, PluginContext};
use crate::registry::Registry;

pub fn build(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(CalculatorCommand::load(ctx.config)))
}

/// Numbered submenu over the operation modules found next to the plugin.
pub struct CalculatorCommand {
    operations: Registry,
    span: Span,
}

impl CalculatorCommand {
    pub fn load(config: &Config) -> Self {
        let mut registry = Registry::new("calculator");
        let loader = Loader::new(operations::catalog(), config, "calculator");
        let report = loader.load_numbered(&config.operations_dir(), &mut registry);
        info!(operations = registry.len(), modules = ?report.loaded, "calculator operations initialized");
        Self::with_operations(registry)
    }

    pub fn with_operations(operations: Registry) -> Self {
        Self { operations, span: info_span!("calculator") }
    }

    pub fn operations(&self) -> &Registry {
        &self.operations
    }

    fn display_menu(&self, ctx: &mut Context<'_>) {
        ctx.println("\nCalculator Operations:");
        for (key, operation) in self.operations.iter() {
            ctx.println(&format!("{}. {}", key, operation.label()));
        }
        ctx.println("0. Back");
    }
}

impl Command for CalculatorCommand {
    fn label(&self) -> &str {
        "Calculator"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        let _enter = self.span.enter();
        self.display_menu(ctx);
        loop {
            let choice = ctx.console.read_line("Select an operation: ")?;
            let choice = choice.trim();
            if choice == "0" {
                info!("exiting calculator menu");
                return Ok(Flow::Continue);
            }
            let Some(operation) = self.operations.get(choice) else {
                warn!(choice, "invalid operation selection");
                ctx.println("Invalid selection. Please try again.");
                continue;
            };
            info!(operation = operation.label(), "executing operation");
            let mut nested = Context::new(&mut *ctx.console, &self.operations);
            match operation.execute(&mut nested) {
                Ok(Flow::Continue) => {}
                Ok(flow) => return Ok(flow),
                Err(err) if is_termination(&err) => return Err(err),
                Err(err) => {
                    error!(operation = operation.label(), "error executing operation: {:#}", err);
                    ctx.println(&format!("An error occurred: {:#}", err));
                }
            }
            self.display_menu(ctx);
        }
    }
}
