// lib.rs

pub mod builtins;
pub mod calculator;
pub mod command;
pub mod config;
pub mod console;
pub mod history;
pub mod logging;
pub mod operations;
pub mod parser;
pub mod plugin;
pub mod registry;
pub mod repl;
pub mod util;

pub use command::{Command, Context, Flow};
pub use config::Config;
pub use console::{Console, ScriptedConsole, TerminalConsole};
pub use registry::Registry;
pub use repl::App;
