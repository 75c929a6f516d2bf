use crate::error::{JenkenvError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const VERSION_FILE_NAME: &str = ".jenkins_version";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub jenkenv_dir: PathBuf,

    #[serde(skip)]
    pub versions_dir: PathBuf,

    #[serde(skip)]
    pub config_file: PathBuf,

    /// Base URL of the Jenkins war download index
    pub download_url: String,

    /// Executable used for single-pipeline runs
    pub runner_path: String,
}

impl Default for Config {
    fn default() -> Self {
        let jenkenv_dir = Self::default_jenkenv_dir();

        Self {
            versions_dir: jenkenv_dir.join("versions"),
            config_file: jenkenv_dir.join("config.toml"),
            jenkenv_dir,
            download_url: "https://updates.jenkins-ci.org/download/war".to_string(),
            runner_path: "jenkinsfile-runner".to_string(),
        }
    }
}

impl Config {
    fn default_jenkenv_dir() -> PathBuf {
        // First check JENKENV_DIR environment variable
        if let Ok(dir) = std::env::var("JENKENV_DIR") {
            return PathBuf::from(shellexpand::tilde(&dir).to_string());
        }

        // Fallback to ~/.jenkenv (the layout existing installs expect)
        PathBuf::from(shellexpand::tilde("~/.jenkenv").to_string())
    }

    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Create directories if they don't exist
        std::fs::create_dir_all(&config.jenkenv_dir)?;
        std::fs::create_dir_all(&config.versions_dir)?;

        // Load config file if it exists
        if config.config_file.exists() {
            let contents = std::fs::read_to_string(&config.config_file)?;
            let file_config: Config = toml::from_str(&contents)?;

            // Merge file config with defaults (only certain fields)
            config.download_url = file_config.download_url;
            config.runner_path = file_config.runner_path;
        } else {
            // Create default config file
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| JenkenvError::ConfigError(e.to_string()))?;

        std::fs::write(&self.config_file, contents)?;
        Ok(())
    }

    /// Path of the global version marker
    pub fn global_version_file(&self) -> PathBuf {
        self.jenkenv_dir.join(VERSION_FILE_NAME)
    }

    /// Path of the local version marker for the current working directory
    pub fn local_version_file(&self) -> Result<PathBuf> {
        Ok(std::env::current_dir()?.join(VERSION_FILE_NAME))
    }
}
