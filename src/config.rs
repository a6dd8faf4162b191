use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::consts::CONFIG_FILE_ENV;
use crate::core::Priority;

#[derive(Debug, Default)]
pub(crate) struct LoadedConfig {
    pub(crate) config: Config,
    pub(crate) source: Option<PathBuf>,
    pub(crate) problems: Vec<String>,
}

impl LoadedConfig {
    /// Emit what happened during `Config::load` once logging is up
    pub(crate) fn report(&self) {
        for problem in &self.problems {
            warn!("{problem}");
        }
        if let Some(path) = &self.source {
            debug!(path = %path.display(), "loaded config");
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) priority: Option<Priority>,
    #[serde(default)]
    pub(crate) accuracy: bool,
    #[serde(default)]
    pub(crate) interval_ms: Option<u64>,
    #[serde(default)]
    pub(crate) fastest_interval_ms: Option<u64>,
    #[serde(default)]
    pub(crate) log_file: Option<PathBuf>,
    /// Location access granted by the permission authority
    #[serde(default)]
    pub(crate) allow_location: Option<bool>,
    #[serde(default)]
    pub(crate) debug: bool,
}

impl Config {
    /// Find and parse the first config file. Runs before logging is set
    /// up, so problems are returned for the caller to report.
    pub(crate) fn load() -> LoadedConfig {
        let mut problems = Vec::new();

        // Try config locations in order of priority
        for path in Self::get_config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        return LoadedConfig {
                            config,
                            source: Some(path),
                            problems,
                        };
                    }
                    Err(e) => problems.push(format!("Failed to parse {}: {}", path.display(), e)),
                }
            }
        }

        LoadedConfig {
            config: Self::default(),
            source: None,
            problems,
        }
    }

    pub(crate) fn location_allowed(&self) -> bool {
        self.allow_location.unwrap_or(true)
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 0. Explicit override
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV).filter(|v| !v.is_empty()) {
            paths.push(PathBuf::from(path));
        }

        // 1. XDG config: ~/.config/loclog/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("loclog").join("config.toml"));
        }

        // 2. Platform config dir (macOS Application Support, Windows AppData)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("loclog").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.loclog.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".loclog.toml"));
        }

        paths
    }
}
