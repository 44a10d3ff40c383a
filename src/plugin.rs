// plugin.rs

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, info_span, warn, Span};

use crate::command::Command;
use crate::config::Config;
use crate::registry::Registry;

/// Reserved package name; the caller wires the menu after everything else.
pub const MENU_PLUGIN: &str = "menu";

/// What a plugin constructor gets to look at.
pub struct PluginContext<'a> {
    pub config: &'a Config,
}

pub type BuildFn = fn(&PluginContext<'_>) -> anyhow::Result<Box<dyn Command>>;

/// One command a plugin contributes: display label plus constructor.
#[derive(Clone, Copy)]
pub struct CommandDescriptor {
    pub label: &'static str,
    pub build: BuildFn,
}

/// A compiled-in plugin. It is only loaded when a unit with the same name
/// is found on disk.
#[derive(Clone, Copy)]
pub struct PluginEntry {
    pub name: &'static str,
    pub commands: &'static [CommandDescriptor],
}

#[derive(Clone, Copy, Default)]
pub struct Catalog {
    entries: &'static [PluginEntry],
}

impl Catalog {
    pub const fn new(entries: &'static [PluginEntry]) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&'static PluginEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|entry| entry.name)
    }
}

/// Which children of a plugin directory count as units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Sub-directories; files are ignored.
    Package,
    /// Regular files, named by their stem; sub-directories are ignored.
    Module,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read plugin directory {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no plugin named '{0}' is built in")]
    Unknown(String),
    #[error("plugin '{plugin}' failed to build {label}: {cause:#}")]
    Build {
        plugin: String,
        label: &'static str,
        cause: anyhow::Error,
    },
}

/// Outcome of one loading pass, in discovery order.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<(String, LoadError)>,
}

/// Lists unit names under `dir`, sorted and deduplicated. Hidden entries
/// are skipped. A missing directory yields no units.
pub fn discover(dir: &Path, kind: UnitKind) -> Result<Vec<String>, LoadError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %dir.display(), "plugin directory not found");
            return Ok(Vec::new());
        }
        Err(source) => return Err(LoadError::Discovery { path: dir.to_path_buf(), source }),
    };
    let mut names = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else { continue };
        let path = entry.path();
        let name = match kind {
            UnitKind::Package if file_type.is_dir() => entry.file_name().to_str().map(str::to_string),
            UnitKind::Module if file_type.is_file() => path.file_stem().and_then(|s| s.to_str()).map(str::to_string),
            _ => None,
        };
        match name {
            Some(name) if !name.starts_with('.') && !name.is_empty() => names.push(name),
            _ => {}
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// Scans a plugin directory and registers whatever the catalog provides for
/// each unit it finds.
pub struct Loader<'a> {
    catalog: Catalog,
    ctx: PluginContext<'a>,
    span: Span,
}

impl<'a> Loader<'a> {
    pub fn new(catalog: Catalog, config: &'a Config, scope: &str) -> Self {
        Self {
            catalog,
            ctx: PluginContext { config },
            span: info_span!("loader", scope = scope),
        }
    }

    /// Registers every command of every package under `root` under the
    /// package's name. The reserved `menu` package is left to the caller.
    pub fn load_plugins(&self, root: &Path, registry: &mut Registry) -> LoadReport {
        let _enter = self.span.enter();
        let mut report = LoadReport::default();
        for name in self.discover_or_log(root, UnitKind::Package) {
            if name == MENU_PLUGIN {
                continue;
            }
            match self.build(&name) {
                Ok(commands) => {
                    for command in commands {
                        info!(plugin = %name, label = command.label(), "command registered");
                        registry.register(name.clone(), command);
                    }
                    report.loaded.push(name);
                }
                Err(err) => {
                    error!(plugin = %name, "error loading plugin: {}", err);
                    report.skipped.push((name, err));
                }
            }
        }
        report
    }

    /// Registers every command of every module under `dir` with numeric
    /// keys starting at "1", flattening modules into one list.
    pub fn load_numbered(&self, dir: &Path, registry: &mut Registry) -> LoadReport {
        let _enter = self.span.enter();
        let mut report = LoadReport::default();
        let mut key = registry.len() + 1;
        for name in self.discover_or_log(dir, UnitKind::Module) {
            match self.build(&name) {
                Ok(commands) => {
                    for command in commands {
                        info!(module = %name, label = command.label(), key, "operation registered");
                        registry.register(key.to_string(), command);
                        key += 1;
                    }
                    report.loaded.push(name);
                }
                Err(err) => {
                    error!(module = %name, "error loading operation module: {}", err);
                    report.skipped.push((name, err));
                }
            }
        }
        report
    }

    fn discover_or_log(&self, dir: &Path, kind: UnitKind) -> Vec<String> {
        match discover(dir, kind) {
            Ok(names) => names,
            Err(err) => {
                error!("{}", err);
                Vec::new()
            }
        }
    }

    /// Builds all commands of one unit; either all of them or none register.
    fn build(&self, name: &str) -> Result<Vec<Box<dyn Command>>, LoadError> {
        let entry = self.catalog.lookup(name).ok_or_else(|| LoadError::Unknown(name.to_string()))?;
        entry
            .commands
            .iter()
            .map(|descriptor| {
                (descriptor.build)(&self.ctx).map_err(|cause| LoadError::Build {
                    plugin: name.to_string(),
                    label: descriptor.label,
                    cause,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Context, Flow};
    use crate::console::ScriptedConsole;
    use std::fs;
    use tempfile::TempDir;

    struct Says(&'static str);

    impl Command for Says {
        fn label(&self) -> &str {
            self.0
        }

        fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<Flow> {
            ctx.println(self.0);
            Ok(Flow::Continue)
        }
    }

    fn alpha(_: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
        Ok(Box::new(Says("alpha")))
    }

    fn beta(_: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
        Ok(Box::new(Says("beta")))
    }

    fn broken(_: &PluginContext<'_>) -> anyhow::Result<Box<dyn Command>> {
        anyhow::bail!("history file locked")
    }

    static CATALOG: &[PluginEntry] = &[
        PluginEntry { name: "alpha", commands: &[CommandDescriptor { label: "Alpha", build: alpha }] },
        PluginEntry {
            name: "pair",
            commands: &[
                CommandDescriptor { label: "Alpha", build: alpha },
                CommandDescriptor { label: "Beta", build: beta },
            ],
        },
        PluginEntry { name: "broken", commands: &[CommandDescriptor { label: "Broken", build: broken }] },
        PluginEntry { name: "menu", commands: &[CommandDescriptor { label: "Alpha", build: alpha }] },
    ];

    fn tree(packages: &[&str], files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for p in packages {
            fs::create_dir(dir.path().join(p)).unwrap();
        }
        for f in files {
            fs::write(dir.path().join(f), "").unwrap();
        }
        dir
    }

    #[test]
    fn discover_sorts_packages_and_ignores_files() {
        let dir = tree(&["zeta", "alpha", ".hidden"], &["readme.txt"]);
        assert_eq!(discover(dir.path(), UnitKind::Package).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn discover_modules_by_stem() {
        let dir = tree(&["nested"], &["subtract.plugin", "add.plugin", "add.txt"]);
        assert_eq!(discover(dir.path(), UnitKind::Module).unwrap(), vec!["add", "subtract"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&dir.path().join("absent"), UnitKind::Package).unwrap().is_empty());
    }

    #[test]
    fn loads_known_packages_and_skips_menu() {
        let dir = tree(&["alpha", "menu"], &[]);
        let config = Config::default();
        let loader = Loader::new(Catalog::new(CATALOG), &config, "test");
        let mut registry = Registry::new("test");
        let report = loader.load_plugins(dir.path(), &mut registry);
        assert_eq!(report.loaded, vec!["alpha"]);
        assert_eq!(registry.names(), vec!["alpha"]);
    }

    #[test]
    fn unknown_and_failing_plugins_are_skipped() {
        let dir = tree(&["alpha", "broken", "ghost"], &[]);
        let config = Config::default();
        let loader = Loader::new(Catalog::new(CATALOG), &config, "test");
        let mut registry = Registry::new("test");
        let report = loader.load_plugins(dir.path(), &mut registry);
        assert_eq!(report.loaded, vec!["alpha"]);
        let skipped: Vec<&str> = report.skipped.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(skipped, vec!["broken", "ghost"]);
        assert!(matches!(report.skipped[1].1, LoadError::Unknown(_)));
        assert!(report.skipped[0].1.to_string().contains("history file locked"));
    }

    #[test]
    fn package_commands_share_the_plugin_name() {
        let dir = tree(&["pair"], &[]);
        let config = Config::default();
        let loader = Loader::new(Catalog::new(CATALOG), &config, "test");
        let mut registry = Registry::new("test");
        loader.load_plugins(dir.path(), &mut registry);
        assert_eq!(registry.names(), vec!["pair"]);

        let mut console = ScriptedConsole::default();
        registry.execute_by_name("pair", &mut console).unwrap();
        assert_eq!(console.output(), "beta\n");
    }

    #[test]
    fn numbered_loading_flattens_modules() {
        let dir = tree(&[], &["pair.plugin", "alpha.plugin", "ghost.plugin"]);
        let config = Config::default();
        let loader = Loader::new(Catalog::new(CATALOG), &config, "test");
        let mut registry = Registry::new("test");
        let report = loader.load_numbered(dir.path(), &mut registry);
        assert_eq!(registry.names(), vec!["1", "2", "3"]);
        let labels: Vec<&str> = registry.iter().map(|(_, c)| c.label()).collect();
        assert_eq!(labels, vec!["alpha", "alpha", "beta"]);
        assert_eq!(report.skipped.len(), 1);
    }
}
