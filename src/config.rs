use eyre::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A source of named configuration values (environment variables, config file, test map)
pub trait ConfigSource {
    /// Raw value; `None` when unset
    fn get(&self, key: &str) -> Option<String>;

    /// Value or empty string when unset
    fn value(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    /// Any non-empty value is true, including "false", "n" and " "
    fn flag(&self, key: &str) -> bool {
        !self.value(key).is_empty()
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Values held in memory; backs config files and stands in for the environment in tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// First non-empty value wins, in source order
pub struct Layered {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Layered {
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }
}

impl ConfigSource for Layered {
    fn get(&self, key: &str) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|source| source.get(key))
            .find(|value| !value.is_empty())
    }
}

/// Log level for env_logger when RUST_LOG is not set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Flat `KEY: value` YAML file holding the same keys as the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub path: Option<PathBuf>,
    pub values: MapSource,
}

impl ConfigFile {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            let path = Self::expand_path(path);
            return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check LOGEVENT_CONFIG env var
        if let Ok(env_path) = std::env::var("LOGEVENT_CONFIG") {
            let path = Self::expand_path(Path::new(&env_path));
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from LOGEVENT_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try ./logevent.yaml
        let local_config = PathBuf::from("logevent.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        // Try ~/.config/logevent/logevent.yaml
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("logevent").join("logevent.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // No config file found, the environment is the only source
        log::debug!("No config file found");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let values = Self::parse(&content).context("Failed to parse config file")?;
        if values.is_empty() {
            log::warn!("Config file {} has no values", path.as_ref().display());
        }

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(Self {
            path: Some(path.as_ref().to_path_buf()),
            values,
        })
    }

    /// Parse a flat YAML mapping; scalar values are kept as their text
    pub fn parse(content: &str) -> Result<MapSource> {
        if content.trim().is_empty() {
            return Ok(MapSource::new());
        }

        let raw: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(content)?;
        let mut values = MapSource::new();
        for (key, value) in raw {
            match value {
                serde_yaml::Value::Null => {}
                serde_yaml::Value::String(s) => {
                    values.set(key, s);
                }
                serde_yaml::Value::Bool(b) => {
                    values.set(key, b.to_string());
                }
                serde_yaml::Value::Number(n) => {
                    values.set(key, n.to_string());
                }
                _ => eyre::bail!("Config key {} must be a scalar value", key),
            }
        }
        Ok(values)
    }

    /// Environment first, then this file
    pub fn layered_over_env(self) -> Layered {
        Layered::new(vec![Box::new(ProcessEnv), Box::new(self.values)])
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}
