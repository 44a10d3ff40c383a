// repl.rs

use tracing::{error, info, info_span, Span};

use crate::builtins::{self, MenuCommand};
use crate::command::Flow;
use crate::config::Config;
use crate::console::{is_termination, Console, ConsoleError};
use crate::plugin::{Catalog, LoadReport, Loader, MENU_PLUGIN};
use crate::registry::Registry;
use crate::util::parse_integer;

pub struct App {
    config: Config,
    catalog: Catalog,
    registry: Registry,
    span: Span,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self::with_catalog(config, builtins::catalog())
    }

    pub fn with_catalog(config: Config, catalog: Catalog) -> Self {
        info!(environment = %config.environment, "application configured");
        Self {
            config,
            catalog,
            registry: Registry::new("main"),
            span: info_span!("app"),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Loads every plugin found under the plugins directory, then wires the
    /// menu so it sees the complete registry.
    pub fn load_plugins(&mut self) -> LoadReport {
        let _enter = self.span.enter();
        let loader = Loader::new(self.catalog, &self.config, "main");
        let report = loader.load_plugins(&self.config.plugins_dir, &mut self.registry);
        self.registry.register(MENU_PLUGIN, Box::new(MenuCommand));
        info!(loaded = ?report.loaded, skipped = report.skipped.len(), "menu command registered");
        report
    }

    fn print_main_menu(&self, console: &mut dyn Console) {
        console.println("\nAvailable commands:");
        self.registry.render(console);
        console.println("Type the number of the command to execute, or type 'exit' to exit.");
    }

    /// Runs the session and returns the process exit code. Errors from a
    /// command body end the session; interrupts and end of input do not.
    pub fn start(&mut self, console: &mut dyn Console) -> anyhow::Result<i32> {
        self.load_plugins();
        let _enter = self.span.enter();
        info!("application started");
        let outcome = self.run(console);
        info!("application shutdown");
        outcome
    }

    fn run(&self, console: &mut dyn Console) -> anyhow::Result<i32> {
        self.print_main_menu(console);
        loop {
            let input = match console.read_line(">>> ") {
                Ok(line) => line,
                Err(err @ (ConsoleError::Interrupted | ConsoleError::Eof)) => {
                    info!("application interrupted by user ({}), exiting", err);
                    return Ok(0);
                }
                Err(err) => return Err(err.into()),
            };
            let input = input.trim();
            if input.eq_ignore_ascii_case("exit") {
                info!("exiting application");
                return Ok(0);
            }
            let Some(selection) = parse_integer(input) else {
                error!(input, "non-numeric input received");
                console.println("Only numbers are allowed, wrong input.");
                continue;
            };
            if selection < 1 {
                self.print_main_menu(console);
                continue;
            }
            let Some(name) = usize::try_from(selection - 1).ok().and_then(|i| self.registry.name_at(i)) else {
                error!(selection, "invalid command selection");
                console.println("Invalid selection. Please enter a valid number.");
                continue;
            };
            match self.registry.execute_by_name(name, console) {
                Ok(Flow::Continue) => {
                    info!(command = name, "executed command");
                    self.print_main_menu(console);
                }
                Ok(Flow::Exit(code)) => {
                    info!(command = name, code, "command requested exit");
                    return Ok(code);
                }
                Err(err) if is_termination(&err) => {
                    info!(command = name, "application interrupted by user, exiting");
                    return Ok(0);
                }
                Err(err) => return Err(err.context(format!("command '{}' failed", name))),
            }
        }
    }
}
