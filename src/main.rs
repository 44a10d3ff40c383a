use anyhow::Context as _;
use plugcalc::logging::init_logging;
use plugcalc::{App, Config, TerminalConsole};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_logging(&config.log_dir)?;

    let mut console = TerminalConsole::new()?;
    let mut app = App::new(config);
    let code = app.start(&mut console)?;
    std::process::exit(code);
}
