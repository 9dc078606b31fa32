//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables, and merging configurations with proper precedence rules
//! (CLI > environment > local file > global file > XDG file > defaults).

use crate::error::GeocodeError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML files.
///
/// This represents the structure of configuration files that users can
/// create to set default values for batch runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default worker pool size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default calls-per-second budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<usize>,

    /// Default request timeout (as string, e.g. "5s", "30s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Default country restriction (alpha-2 code)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Default result language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Treat zero-result responses as per-address errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_zero_results: Option<bool>,
}

/// Output preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Output file path overriding the format-derived default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, GeocodeError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(GeocodeError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            GeocodeError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| GeocodeError::Config {
            message: format!("Failed to parse TOML configuration: {}", e),
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them,
    /// later (more local) files winning over earlier ones.
    pub fn discover_and_load(&self) -> Result<FileConfig, GeocodeError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        // 1. XDG config (lowest precedence)
        if let Some(xdg_path) = self.get_xdg_config_path() {
            if let Ok(config) = self.load_file(&xdg_path) {
                merged_config = self.merge_configs(merged_config, config);
                loaded_files.push(xdg_path);
            }
        }

        // 2. Global config in the home directory
        if let Some(global_path) = self.get_global_config_path() {
            if let Ok(config) = self.load_file(&global_path) {
                merged_config = self.merge_configs(merged_config, config);
                loaded_files.push(global_path);
            }
        }

        // 3. Local config (highest precedence)
        if let Some(local_path) = self.get_local_config_path() {
            if let Ok(config) = self.load_file(&local_path) {
                merged_config = self.merge_configs(merged_config, config);
                loaded_files.push(local_path);
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            eprintln!("Multiple config files found. Using precedence:");
            for (i, path) in loaded_files.iter().enumerate() {
                let status = if i == loaded_files.len() - 1 {
                    "active"
                } else {
                    "overridden"
                };
                eprintln!("   {} ({})", path.display(), status);
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path (current directory).
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./geocode.toml", "./.geocode.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Get the global configuration file path (home directory).
    fn get_global_config_path(&self) -> Option<PathBuf> {
        if let Some(home) = env::var_os("HOME") {
            let candidates = [".geocode.toml", "geocode.toml"];

            for candidate in &candidates {
                let path = Path::new(&home).join(candidate);
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("geocode").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.rate_limit.is_some() {
                        lower_defaults.rate_limit = higher_defaults.rate_limit;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.country.is_some() {
                        lower_defaults.country = higher_defaults.country;
                    }
                    if higher_defaults.language.is_some() {
                        lower_defaults.language = higher_defaults.language;
                    }
                    if higher_defaults.strict_zero_results.is_some() {
                        lower_defaults.strict_zero_results = higher_defaults.strict_zero_results;
                    }
                    Some(lower_defaults)
                }
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
            output: higher.output.or(lower.output),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), GeocodeError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(GeocodeError::Config {
                        message: "Concurrency must be between 1 and 100".to_string(),
                    });
                }
            }

            if let Some(rate_limit) = defaults.rate_limit {
                if rate_limit == 0 {
                    return Err(GeocodeError::Config {
                        message: "Rate limit must be at least 1 call per second".to_string(),
                    });
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(GeocodeError::Config {
                        message: format!(
                            "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                            timeout_str
                        ),
                    });
                }
            }

            if let Some(country) = &defaults.country {
                if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(GeocodeError::Config {
                        message: format!(
                            "Invalid country code '{}'. Use an ISO 3166-1 alpha-2 code",
                            country
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// These values can be set via GEOCODE_* environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub rate_limit: Option<usize>,
    pub timeout: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub output: Option<String>,
    pub config: Option<String>,
    pub strict_zero_results: Option<bool>,
}

/// Load configuration from environment variables.
///
/// Parses all GEOCODE_* environment variables and returns a structured
/// configuration. Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // GEOCODE_CONCURRENCY - worker pool size
    if let Ok(val) = env::var("GEOCODE_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= 100 => {
                env_config.concurrency = Some(concurrency);
                if verbose {
                    println!("Using GEOCODE_CONCURRENCY={}", concurrency);
                }
            }
            _ => {
                if verbose {
                    eprintln!("Invalid GEOCODE_CONCURRENCY='{}', must be 1-100", val);
                }
            }
        }
    }

    // GEOCODE_RATE_LIMIT - calls per second
    if let Ok(val) = env::var("GEOCODE_RATE_LIMIT") {
        match val.parse::<usize>() {
            Ok(rate) if rate > 0 => {
                env_config.rate_limit = Some(rate);
                if verbose {
                    println!("Using GEOCODE_RATE_LIMIT={}", rate);
                }
            }
            _ => {
                if verbose {
                    eprintln!("Invalid GEOCODE_RATE_LIMIT='{}', must be a positive integer", val);
                }
            }
        }
    }

    // GEOCODE_TIMEOUT - per-request timeout
    if let Ok(timeout_str) = env::var("GEOCODE_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            env_config.timeout = Some(timeout_str.clone());
            if verbose {
                println!("Using GEOCODE_TIMEOUT={}", timeout_str);
            }
        } else if verbose {
            eprintln!(
                "Invalid GEOCODE_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                timeout_str
            );
        }
    }

    // GEOCODE_COUNTRY - country restriction
    if let Ok(country) = env::var("GEOCODE_COUNTRY") {
        if !country.trim().is_empty() {
            env_config.country = Some(country.clone());
            if verbose {
                println!("Using GEOCODE_COUNTRY={}", country);
            }
        }
    }

    // GEOCODE_LANG - result language
    if let Ok(language) = env::var("GEOCODE_LANG") {
        if !language.trim().is_empty() {
            env_config.language = Some(language.clone());
            if verbose {
                println!("Using GEOCODE_LANG={}", language);
            }
        }
    }

    // GEOCODE_OUTPUT - output file path
    if let Ok(output) = env::var("GEOCODE_OUTPUT") {
        if !output.trim().is_empty() {
            env_config.output = Some(output.clone());
            if verbose {
                println!("Using GEOCODE_OUTPUT={}", output);
            }
        }
    }

    // GEOCODE_CONFIG - explicit config file
    if let Ok(config_path) = env::var("GEOCODE_CONFIG") {
        if !config_path.trim().is_empty() {
            env_config.config = Some(config_path.clone());
            if verbose {
                println!("Using GEOCODE_CONFIG={}", config_path);
            }
        }
    }

    // GEOCODE_STRICT_ZERO_RESULTS - zero-result handling
    if let Ok(val) = env::var("GEOCODE_STRICT_ZERO_RESULTS") {
        match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => {
                env_config.strict_zero_results = Some(true);
                if verbose {
                    println!("Using GEOCODE_STRICT_ZERO_RESULTS=true");
                }
            }
            "false" | "0" | "no" | "off" => {
                env_config.strict_zero_results = Some(false);
                if verbose {
                    println!("Using GEOCODE_STRICT_ZERO_RESULTS=false");
                }
            }
            _ => {
                if verbose {
                    eprintln!("Invalid GEOCODE_STRICT_ZERO_RESULTS='{}', use true/false", val);
                }
            }
        }
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if timeout_str.ends_with('s') {
        timeout_str
            .strip_suffix('s')
            .and_then(|s| s.parse::<u64>().ok())
    } else if timeout_str.ends_with('m') {
        timeout_str
            .strip_suffix('m')
            .and_then(|s| s.parse::<u64>().ok())
            .map(|m| m * 60)
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[defaults]
concurrency = 8
rate_limit = 25
country = "DE"

[output]
path = "geocoded.json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();

        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.concurrency, Some(8));
        assert_eq!(defaults.rate_limit, Some(25));
        assert_eq!(defaults.country.as_deref(), Some("DE"));

        let output = config.output.unwrap();
        assert_eq!(output.path.as_deref(), Some("geocoded.json"));
    }

    #[test]
    fn test_invalid_concurrency() {
        let config_content = r#"
[defaults]
concurrency = 0
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let manager = ConfigManager::new(false);
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_country_code() {
        let config_content = r#"
[defaults]
country = "Germany"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let manager = ConfigManager::new(false);
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let manager = ConfigManager::new(false);
        let result = manager.load_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(GeocodeError::File { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(4),
                country: Some("US".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(16),
                language: Some("en".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.concurrency, Some(16)); // Higher wins
        assert_eq!(defaults.country.as_deref(), Some("US")); // Lower preserved
        assert_eq!(defaults.language.as_deref(), Some("en")); // Higher wins
    }
}
