use thiserror::Error;

#[derive(Error, Debug)]
pub enum JenkenvError {
    #[error("no version selected; run `jenkenv use <local|global> <version>` or pass a version argument")]
    NoVersionSelected,

    #[error("Jenkins version {0} is not installed")]
    VersionNotFound(String),

    #[error("Failed to download from {url}: {source}")]
    DownloadFailed {
        url: String,
        source: reqwest::Error,
    },

    #[error("Failed to extract archive: {0}")]
    ExtractionFailed(String),

    #[error("Failed to start `{command}`: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, JenkenvError>;
