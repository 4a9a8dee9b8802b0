//! IdeaPlan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main IdeaPlan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Local model server configuration
    pub local: LocalConfig,

    /// Cloud completion API configuration
    pub cloud: CloudConfig,

    /// Plan history storage
    pub storage: StorageConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

impl Config {
    /// Validate that a cloud selection without an explicit key can find one
    ///
    /// Call this before building a cloud backend from the environment so the
    /// user gets a clear message instead of an authentication failure.
    pub fn validate_cloud_key(&self) -> Result<String> {
        std::env::var(&self.cloud.api_key_env).map_err(|_| {
            eyre::eyre!(
                "Cloud API key not found. Set the {} environment variable or provide an API key.",
                self.cloud.api_key_env
            )
        })
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Errors are swallowed here; the full `load` reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => Some(path.clone()),
            None => Self::candidates().into_iter().find(|p| p.exists()),
        }?;

        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<Self>(&content).ok()?.log_level
    }

    /// Project-local config first, then the user config directory
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("ideaplan.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ideaplan").join("ideaplan.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Convert a millisecond setting to an optional timeout (0 means none)
fn optional_timeout(ms: u64) -> Option<Duration> {
    if ms == 0 { None } else { Some(Duration::from_millis(ms)) }
}

/// Local (Ollama-compatible) model server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Server base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Timeout for connectivity probes and model discovery
    #[serde(rename = "probe-timeout-ms")]
    pub probe_timeout_ms: u64,

    /// Generation timeout in milliseconds (0 = wait for the server)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            probe_timeout_ms: 5_000,
            timeout_ms: 0,
        }
    }
}

impl LocalConfig {
    pub fn timeout(&self) -> Option<Duration> {
        optional_timeout(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Cloud (OpenAI-compatible) completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Maximum tokens for chat completions
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Maximum tokens for image analysis
    #[serde(rename = "vision-max-tokens")]
    pub vision_max_tokens: u32,

    /// Model used for image analysis when the selected model is not a vision model
    #[serde(rename = "vision-model")]
    pub vision_model: String,

    /// Model used by the connectivity probe
    #[serde(rename = "probe-model")]
    pub probe_model: String,

    /// Timeout for connectivity probes
    #[serde(rename = "probe-timeout-ms")]
    pub probe_timeout_ms: u64,

    /// Generation timeout in milliseconds (0 = wait for the server)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 2000,
            vision_max_tokens: 1000,
            vision_model: "gpt-4o".to_string(),
            probe_model: "gpt-3.5-turbo".to_string(),
            probe_timeout_ms: 5_000,
            timeout_ms: 0,
        }
    }
}

impl CloudConfig {
    pub fn timeout(&self) -> Option<Duration> {
        optional_timeout(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding saved plan JSON files
    #[serde(rename = "plans-dir")]
    pub plans_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            plans_dir: PathBuf::from("plans"),
        }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory with `.pmt` overrides; embedded templates are used otherwise
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.local.base_url, "http://localhost:11434");
        assert_eq!(config.cloud.max_tokens, 2000);
        assert_eq!(config.cloud.vision_max_tokens, 1000);
        assert_eq!(config.storage.plans_dir, PathBuf::from("plans"));
        assert!(config.prompts.dir.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_timeouts() {
        let config = Config::default();
        assert_eq!(config.local.timeout(), None);
        assert_eq!(config.local.probe_timeout(), Duration::from_secs(5));

        let cloud = CloudConfig {
            timeout_ms: 30_000,
            ..Default::default()
        };
        assert_eq!(cloud.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

local:
  base-url: http://gpu-box:11434
  probe-timeout-ms: 2000

cloud:
  base-url: https://llm.example.com
  api-key-env: MY_API_KEY
  max-tokens: 4000
  vision-model: gpt-4o-mini

storage:
  plans-dir: /tmp/plans

prompts:
  dir: ./prompt-overrides
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.local.base_url, "http://gpu-box:11434");
        assert_eq!(config.local.probe_timeout_ms, 2000);
        assert_eq!(config.cloud.api_key_env, "MY_API_KEY");
        assert_eq!(config.cloud.max_tokens, 4000);
        assert_eq!(config.cloud.vision_model, "gpt-4o-mini");
        assert_eq!(config.storage.plans_dir, PathBuf::from("/tmp/plans"));
        assert_eq!(config.prompts.dir, Some(PathBuf::from("./prompt-overrides")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
cloud:
  probe-model: gpt-4o-mini
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.cloud.probe_model, "gpt-4o-mini");

        // Defaults for unspecified
        assert_eq!(config.cloud.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.cloud.vision_model, "gpt-4o");
        assert_eq!(config.local.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "log-level: warn\nstorage:\n  plans-dir: saved\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.storage.plans_dir, PathBuf::from("saved"));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_path_missing() {
        let missing = PathBuf::from("/nonexistent/ideaplan.yml");
        assert!(Config::load(Some(&missing)).is_err());
        assert!(Config::load_log_level(Some(&missing)).is_none());
    }

    #[test]
    #[serial]
    fn test_validate_cloud_key_missing() {
        let mut config = Config::default();
        config.cloud.api_key_env = "NONEXISTENT_IDEAPLAN_KEY_12345".to_string();

        let err = config.validate_cloud_key().unwrap_err().to_string();
        assert!(err.contains("NONEXISTENT_IDEAPLAN_KEY_12345"));
        assert!(err.ends_with("or provide an API key."));
        assert!(!err.contains("--api-key"));
    }

    #[test]
    #[serial]
    fn test_validate_cloud_key_present() {
        let mut config = Config::default();
        config.cloud.api_key_env = "IDEAPLAN_TEST_KEY".to_string();

        // SAFETY: serialised with the other env-mutating tests
        unsafe {
            std::env::set_var("IDEAPLAN_TEST_KEY", "sk-test");
        }
        let key = config.validate_cloud_key();
        unsafe {
            std::env::remove_var("IDEAPLAN_TEST_KEY");
        }

        assert_eq!(key.unwrap(), "sk-test");
    }
}
