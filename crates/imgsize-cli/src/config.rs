use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Number of parallel workers for batch analysis
    #[serde(default = "default_jobs")]
    pub parallel_jobs: usize,

    /// Show progress bars
    #[serde(default = "default_progress")]
    pub show_progress: bool,

    /// Colored output
    #[serde(default = "default_color")]
    pub colored_output: bool,

    /// Print JSON unless asked otherwise
    #[serde(default)]
    pub json_output: bool,
}

fn default_jobs() -> usize {
    num_cpus::get()
}

fn default_progress() -> bool {
    true
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel_jobs: default_jobs(),
            show_progress: default_progress(),
            colored_output: default_color(),
            json_output: false,
        }
    }
}

impl Config {
    /// Get config file path (XDG-compliant)
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = directories::ProjectDirs::from("", "", "imgsize")
            .context("Failed to determine config directory")?
            .config_dir()
            .to_path_buf();

        fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path).context("Failed to read config file")?;

            let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

            tracing::debug!("Loaded config from {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Created default config at {:?}", config_path);
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, content).context("Failed to write config file")?;

        tracing::debug!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Update one key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || format!("Invalid value for {key}: {value}");

        match key {
            "parallel_jobs" => self.parallel_jobs = value.parse().with_context(invalid)?,
            "show_progress" => self.show_progress = value.parse().with_context(invalid)?,
            "colored_output" => self.colored_output = value.parse().with_context(invalid)?,
            "json_output" => self.json_output = value.parse().with_context(invalid)?,
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Reset to defaults
    pub fn reset() -> Result<()> {
        let config = Self::default();
        config.save()
    }
}
