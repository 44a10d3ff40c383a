// config.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_PLUGINS_DIR: &str = "plugins";
pub const DEFAULT_HISTORY_FILE: &str = "history.csv";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_ENVIRONMENT: &str = "PRODUCTION";
pub const DOTENV_FILE: &str = ".env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
    #[error("failed to read {path}: {source}")]
    DotEnv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Settings captured from the process environment at startup, with a
/// `.env` file in the working directory supplying defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub plugins_dir: PathBuf,
    pub history_file: PathBuf,
    pub log_dir: PathBuf,
    pub environment: String,
    vars: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            vars: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_dotenv(Path::new(DOTENV_FILE), std::env::vars())
    }

    /// Layers `vars` over the entries of the dotenv file at `path`. A
    /// missing file is the same as an empty one.
    pub fn from_dotenv<I>(path: &Path, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let dotenv_error = |source| ConfigError::DotEnv { path: path.to_path_buf(), source };
        let mut merged: HashMap<String, String> = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter.collect::<Result<_, _>>().map_err(dotenv_error)?,
            Err(err) if err.not_found() => HashMap::new(),
            Err(err) => return Err(dotenv_error(err)),
        };
        merged.extend(vars);
        Self::from_vars(merged)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = vars.into_iter().collect();
        let path = |vars: &HashMap<String, String>, key: &'static str, default: &str| match vars.get(key) {
            Some(v) if v.trim().is_empty() => Err(ConfigError::Empty { key }),
            Some(v) => Ok(PathBuf::from(v)),
            None => Ok(PathBuf::from(default)),
        };
        let plugins_dir = path(&vars, "CALC_PLUGINS_DIR", DEFAULT_PLUGINS_DIR)?;
        let history_file = path(&vars, "CALC_HISTORY_FILE", DEFAULT_HISTORY_FILE)?;
        let log_dir = path(&vars, "CALC_LOG_DIR", DEFAULT_LOG_DIR)?;
        let environment = vars
            .entry("ENVIRONMENT".to_string())
            .or_insert_with(|| DEFAULT_ENVIRONMENT.to_string())
            .clone();
        Ok(Self { plugins_dir, history_file, log_dir, environment, vars })
    }

    /// Raw lookup into the captured environment.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Directory holding the operation modules of the calculator plugin.
    pub fn operations_dir(&self) -> PathBuf {
        self.plugins_dir.join("calculator")
    }
}
