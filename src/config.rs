//! Reporter configuration loaded from environment variables.

use std::env;

/// Default values for optional settings.
pub mod defaults {
    pub const MAX_CONCURRENT_UPLOADS: usize = 8; // Blob uploads in flight at once
    pub const UPLOAD_TIMEOUT_SECS: u64 = 60; // Per-request timeout
    pub const MAX_ENVIRONMENT_LENGTH: usize = 64;
}

/// Values supplied on the command line.
///
/// Environment variables win over these, so a CI job can pin the target
/// regardless of what the invoking script passes.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub environment: Option<String>,
    pub api: Option<String>,
    pub max_concurrent_uploads: Option<usize>,
    pub upload_timeout_secs: Option<u64>,
}

/// Reporter configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment tag the run is filed under (e.g. "prod")
    pub environment: String,
    /// Base URL of the artifact store and history API, without trailing slash
    pub api: String,
    /// Maximum number of uploads in flight
    pub max_concurrent_uploads: usize,
    /// Timeout for each HTTP request in seconds
    pub upload_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ENVIRONMENT`: Environment tag - REQUIRED, at most 64 characters
    /// - `API`: Artifact store base URL - REQUIRED
    /// - `REPORTER_MAX_CONCURRENT_UPLOADS`: Max uploads in flight (default: 8)
    /// - `REPORTER_UPLOAD_TIMEOUT_SECS`: Per-request timeout (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&ConfigOverrides::default())
    }

    /// Load configuration from environment variables, falling back to `overrides`.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| overrides.environment.clone())
            .ok_or(ConfigError::MissingEnvVar("ENVIRONMENT"))?;

        let api = non_empty("API")
            .or_else(|| overrides.api.clone())
            .ok_or(ConfigError::MissingEnvVar("API"))?
            .trim_end_matches('/')
            .to_string();

        let max_concurrent_uploads = match non_empty("REPORTER_MAX_CONCURRENT_UPLOADS") {
            Some(v) => v.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue("REPORTER_MAX_CONCURRENT_UPLOADS must be a valid number")
            })?,
            None => overrides
                .max_concurrent_uploads
                .unwrap_or(defaults::MAX_CONCURRENT_UPLOADS),
        };

        let upload_timeout_secs = match non_empty("REPORTER_UPLOAD_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("REPORTER_UPLOAD_TIMEOUT_SECS must be a valid number")
            })?,
            None => overrides
                .upload_timeout_secs
                .unwrap_or(defaults::UPLOAD_TIMEOUT_SECS),
        };

        let config = Config {
            environment,
            api,
            max_concurrent_uploads,
            upload_timeout_secs,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate value ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.environment.chars().count() > defaults::MAX_ENVIRONMENT_LENGTH {
            errors.push(format!(
                "ENVIRONMENT must be at most {} characters",
                defaults::MAX_ENVIRONMENT_LENGTH
            ));
        }

        if !self.api.starts_with("http://") && !self.api.starts_with("https://") {
            errors.push(format!(
                "API must be an http(s) URL, e.g. http://playwright.example.com (got '{}')",
                self.api
            ));
        }

        if self.max_concurrent_uploads == 0 {
            errors.push("REPORTER_MAX_CONCURRENT_UPLOADS must be at least 1".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        Ok(())
    }
}

/// Addresses of one run inside the artifact store.
///
/// Uploads are namespaced by environment and run name so that two runs never
/// overwrite each other's blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    pub api: String,
    pub environment: String,
    pub run_name: String,
}

impl RunTarget {
    pub fn new(config: &Config, run_name: impl Into<String>) -> Self {
        RunTarget {
            api: config.api.clone(),
            environment: config.environment.clone(),
            run_name: run_name.into(),
        }
    }

    /// Dashboard URL of the run: `{api}/{environment}/{run_name}`.
    pub fn report_url(&self) -> String {
        format!("{}/{}/{}", self.api, self.environment, self.run_name)
    }

    /// Fully qualified URL of a content-addressed blob.
    pub fn blob_url(&self, name: &str) -> String {
        format!("{}/{}", self.report_url(), name)
    }

    /// Multipart upload endpoint scoped to this run.
    pub fn upload_url(&self) -> String {
        format!(
            "{}/api/upload?runName={}&environment={}",
            self.api,
            urlencoding::encode(&self.run_name),
            urlencoding::encode(&self.environment)
        )
    }

    /// Bulk history ingestion endpoint.
    pub fn history_url(&self) -> String {
        format!("{}/api/history/bulk", self.api)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}
