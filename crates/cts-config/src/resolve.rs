//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths →
//! system paths → built-in default.

use std::path::{Path, PathBuf};

use crate::model::ModelConfig;
use crate::preset::{get_preset, PresetName};
use crate::validate::{ValidationError, ValidationResult};

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to the model config (or None if not found).
    pub model: Option<PathBuf>,

    /// Where the model config was found (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/cts/.
    SystemConfig,

    /// Named preset chosen by the caller.
    Preset,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::Preset => write!(f, "preset"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "CTS_CONFIG";
pub const ENV_CONFIG_DIR: &str = "CTS_CONFIG_DIR";

/// Standard config file names, in lookup order.
const CONFIG_FILENAMES: &[&str] = &["model.toml", "model.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "cts";

/// Resolve the model configuration path.
///
/// 1. Explicit CLI path (if it exists)
/// 2. `CTS_CONFIG` environment variable
/// 3. `CTS_CONFIG_DIR` + `model.toml` / `model.json`
/// 4. XDG config directory (~/.config/cts/)
/// 5. System config (/etc/cts/)
/// 6. Built-in default (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    let mut paths = ConfigPaths::default();

    if let Some(path) = cli_path {
        if path.exists() {
            paths.model = Some(path.to_path_buf());
            paths.source = ConfigSource::CliArgument;
            return paths;
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            paths.model = Some(path);
            paths.source = ConfigSource::Environment;
            return paths;
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&config_dir)) {
            paths.model = Some(path);
            paths.source = ConfigSource::Environment;
            return paths;
        }
    }

    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = find_in_dir(&dir) {
            paths.model = Some(path);
            paths.source = ConfigSource::XdgConfig;
            return paths;
        }
    }

    if let Some(path) = find_in_dir(&system_config_dir()) {
        paths.model = Some(path);
        paths.source = ConfigSource::SystemConfig;
        return paths;
    }

    paths.source = ConfigSource::BuiltinDefault;
    paths
}

/// Load the model configuration for a run.
///
/// An explicit CLI path that does not exist is an error rather than a silent
/// fallback. A preset takes precedence over discovered files but not over an
/// explicit path.
pub fn load_model_config(
    cli_path: Option<&Path>,
    preset: Option<PresetName>,
) -> ValidationResult<(ModelConfig, ConfigSource)> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ValidationError::IoError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), "loading model config from CLI path");
        return Ok((ModelConfig::from_file(path)?, ConfigSource::CliArgument));
    }

    if let Some(name) = preset {
        tracing::debug!(preset = %name, "using model preset");
        return Ok((get_preset(name), ConfigSource::Preset));
    }

    let paths = resolve_config(None);
    match paths.model {
        Some(path) => {
            tracing::debug!(path = %path.display(), source = %paths.source, "loading model config");
            Ok((ModelConfig::from_file(&path)?, paths.source))
        }
        None => Ok((get_preset(PresetName::Bytes), ConfigSource::BuiltinDefault)),
    }
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for cts.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
