// operations.rs

use tracing::{error, info, warn};

use crate::command::{Command, Context, Flow};
use crate::history::HistoryStore;
use crate::plugin::{Catalog, CommandDescriptor, PluginContext, PluginEntry};
use crate::util::{format_number, parse_integer};

/// Operation modules of the calculator plugin. A module contributes its
/// commands in the listed order.
static OPERATIONS: &[PluginEntry] = &[
    PluginEntry { name: "add", commands: &[CommandDescriptor { label: "Add", build: build_add }] },
    PluginEntry { name: "divide", commands: &[CommandDescriptor { label: "Divide", build: build_divide }] },
    PluginEntry {
        name: "history_commands",
        commands: &[
            CommandDescriptor { label: "ClearHistory", build: build_clear_history },
            CommandDescriptor { label: "DeleteSpecificRecord", build: build_delete_record },
            CommandDescriptor { label: "ShowHistory", build: build_show_history },
        ],
    },
    PluginEntry { name: "multiply", commands: &[CommandDescriptor { label: "Multiply", build: build_multiply }] },
    PluginEntry { name: "subtract", commands: &[CommandDescriptor { label: "Subtract", build: build_subtract }] },
];

pub fn catalog() -> Catalog {
    Catalog::new(OPERATIONS)
}

fn open_history(ctx: &PluginContext<'_>) -> anyhow::Result<HistoryStore> {
    Ok(HistoryStore::open(&ctx.config.history_file)?)
}

/// Arithmetic still works without a usable history file; it just records
/// nothing.
fn optional_history(ctx: &PluginContext<'_>) -> Option<HistoryStore> {
    match HistoryStore::open(&ctx.config.history_file) {
        Ok(store) => Some(store),
        Err(err) => {
            warn!(error = %err, "history unavailable, calculations will not be recorded");
            None
        }
    }
}

fn build_add(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(Arithmetic::add(optional_history(ctx))))
}

fn build_subtract(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(Arithmetic::subtract(optional_history(ctx))))
}

fn build_multiply(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(Arithmetic::multiply(optional_history(ctx))))
}

fn build_divide(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(Arithmetic::divide(optional_history(ctx))))
}

fn build_clear_history(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(ClearHistory { history: open_history(ctx)? }))
}

fn build_delete_record(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(DeleteSpecificRecord { history: open_history(ctx)? }))
}

fn build_show_history(ctx: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
    Ok(Box::new(ShowHistory { history: open_history(ctx)? }))
}

/// Binary operation that reads two operands, prints the result and records
/// it in the history when one is attached. A failed write is logged and
/// does not fail the calculation.
pub struct Arithmetic {
    label: &'static str,
    symbol: char,
    apply: fn(f64, f64) -> Option<f64>,
    history: Option<HistoryStore>,
}

impl Arithmetic {
    pub fn add(history: Option<HistoryStore>) -> Self {
        Self { label: "Add", symbol: '+', apply: |a, b| Some(a + b), history }
    }

    pub fn subtract(history: Option<HistoryStore>) -> Self {
        Self { label: "Subtract", symbol: '-', apply: |a, b| Some(a - b), history }
    }

    pub fn multiply(history: Option<HistoryStore>) -> Self {
        Self { label: "Multiply", symbol: '*', apply: |a, b| Some(a * b), history }
    }

    /// `None` from `apply` means division by zero.
    pub fn divide(history: Option<HistoryStore>) -> Self {
        Self { label: "Divide", symbol: '/', apply: |a, b| if b == 0.0 { None } else { Some(a / b) }, history }
    }
}

fn read_operand(ctx: &mut Context<'_>, prompt: &str) -> anyhow::Result<Option<f64>> {
    let input = ctx.console.read_line(prompt)?;
    Ok(input.trim().parse::<f64>().ok())
}

impl Command for Arithmetic {
    fn label(&self) -> &str {
        self.label
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        let operands = match read_operand(ctx, "Enter first number: ")? {
            Some(a) => read_operand(ctx, "Enter second number: ")?.map(|b| (a, b)),
            None => None,
        };
        let Some((a, b)) = operands else {
            error!(operation = self.label, "invalid operand input");
            ctx.println("Error: Please enter valid numbers.");
            return Ok(Flow::Continue);
        };
        let Some(result) = (self.apply)(a, b) else {
            error!("division by zero attempted");
            ctx.println("Error: Cannot divide by zero.");
            return Ok(Flow::Continue);
        };
        info!(operation = self.label, a, b, result, "calculated");
        ctx.println(&format!(
            "The result of {} {} {} is {}",
            format_number(a),
            self.symbol,
            format_number(b),
            format_number(result)
        ));
        if let Some(history) = &self.history {
            if let Err(err) = history.add_record(self.label, a, b, result) {
                error!(operation = self.label, error = %err, "failed to record calculation");
            }
        }
        Ok(Flow::Continue)
    }
}

pub struct ShowHistory {
    history: HistoryStore,
}

impl Command for ShowHistory {
    fn label(&self) -> &str {
        "ShowHistory"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        ctx.println("\nCalculation History:");
        for line in self.history.render()?.lines() {
            ctx.println(line);
        }
        Ok(Flow::Continue)
    }
}

pub struct ClearHistory {
    history: HistoryStore,
}

impl Command for ClearHistory {
    fn label(&self) -> &str {
        "ClearHistory"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        self.history.clear()?;
        ctx.println("History has been cleared.");
        Ok(Flow::Continue)
    }
}

pub struct DeleteSpecificRecord {
    history: HistoryStore,
}

impl Command for DeleteSpecificRecord {
    fn label(&self) -> &str {
        "DeleteSpecificRecord"
    }

    fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
        let input = ctx.console.read_line("Enter the record index to delete: ")?;
        let index = match parse_integer(input.trim()) {
            Some(index) => index,
            None => {
                ctx.println("Invalid input. Please enter a valid number.");
                return Ok(Flow::Continue);
            }
        };
        let removed = match usize::try_from(index) {
            Ok(index) => self.history.delete_at(index)?,
            Err(_) => None,
        };
        match removed {
            Some(record) => {
                info!(index, operation = %record.operation, "history record deleted");
                ctx.println(&format!("Record {} deleted.", index));
            }
            None => ctx.println("Invalid record index."),
        }
        Ok(Flow::Continue)
    }
}
