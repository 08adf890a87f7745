//! Application configuration for DealScout.
//!
//! User config lives at `~/.dealscout/dealscout.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file, only the names of the env vars
//! that hold them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DealScoutError, Result};
use crate::profile_url::DEFAULT_PROFILE_HOST;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "dealscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".dealscout";

// ---------------------------------------------------------------------------
// Config structs (matching dealscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline thresholds.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Keyword search backend.
    #[serde(default)]
    pub keyword_search: KeywordSearchConfig,

    /// Grounded generation backend.
    #[serde(default)]
    pub grounded_search: GroundedSearchConfig,

    /// Link validation and repair.
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Bucket size below which conditional passes escalate.
    #[serde(default = "default_min_bucket_size")]
    pub min_bucket_size: usize,

    /// Total validated profiles below which the fallback sweep replaces the
    /// bucketed result.
    #[serde(default = "default_min_total_profiles")]
    pub min_total_profiles: usize,

    /// Host whose `/in/` paths count as personal profiles.
    #[serde(default = "default_profile_host")]
    pub profile_host: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            min_bucket_size: default_min_bucket_size(),
            min_total_profiles: default_min_total_profiles(),
            profile_host: default_profile_host(),
        }
    }
}

fn default_min_bucket_size() -> usize {
    5
}
fn default_min_total_profiles() -> usize {
    3
}
fn default_profile_host() -> String {
    DEFAULT_PROFILE_HOST.into()
}

/// `[keyword_search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSearchConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_keyword_key_env")]
    pub api_key_env: String,

    /// Search endpoint URL.
    #[serde(default = "default_keyword_endpoint")]
    pub endpoint: String,

    /// Search depth flag sent with every query.
    #[serde(default = "default_search_depth")]
    pub search_depth: String,

    /// Result-count cap per query.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Pause after each query.
    #[serde(default = "default_query_delay")]
    pub query_delay_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_keyword_timeout")]
    pub timeout_secs: u64,
}

impl Default for KeywordSearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_keyword_key_env(),
            endpoint: default_keyword_endpoint(),
            search_depth: default_search_depth(),
            max_results: default_max_results(),
            query_delay_ms: default_query_delay(),
            timeout_secs: default_keyword_timeout(),
        }
    }
}

fn default_keyword_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_keyword_endpoint() -> String {
    "https://api.tavily.com/search".into()
}
fn default_search_depth() -> String {
    "advanced".into()
}
fn default_max_results() -> u32 {
    5
}
fn default_query_delay() -> u64 {
    300
}
fn default_keyword_timeout() -> u64 {
    30
}

/// `[grounded_search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedSearchConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_grounded_key_env")]
    pub api_key_env: String,

    /// API base URL (without the `models/...` suffix).
    #[serde(default = "default_grounded_base_url")]
    pub base_url: String,

    /// Model ID.
    #[serde(default = "default_grounded_model")]
    pub model: String,

    /// Output token cap per request.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cooldown after every call.
    #[serde(default = "default_cooldown")]
    pub cooldown_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_grounded_timeout")]
    pub timeout_secs: u64,
}

impl Default for GroundedSearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_grounded_key_env(),
            base_url: default_grounded_base_url(),
            model: default_grounded_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            cooldown_ms: default_cooldown(),
            timeout_secs: default_grounded_timeout(),
        }
    }
}

fn default_grounded_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_grounded_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_grounded_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_temperature() -> f32 {
    0.4
}
fn default_cooldown() -> u64 {
    1000
}
fn default_grounded_timeout() -> u64 {
    120
}

/// `[validation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether to probe and repair profile links at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Timeout for the liveness GET.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// HTML web search endpoint used for name-based repair.
    #[serde(default = "default_repair_endpoint")]
    pub repair_search_endpoint: String,

    /// Timeout for the repair search.
    #[serde(default = "default_repair_timeout")]
    pub repair_timeout_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_timeout_secs: default_probe_timeout(),
            repair_search_endpoint: default_repair_endpoint(),
            repair_timeout_secs: default_repair_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_repair_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_repair_timeout() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Runtime credentials
// ---------------------------------------------------------------------------

/// API keys resolved from the environment.
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Keyword backend key; the backend is optional.
    pub keyword: Option<String>,
    /// Grounded backend key; required.
    pub grounded: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("keyword", &self.keyword.as_ref().map(|_| "<redacted>"))
            .field("grounded", &"<redacted>")
            .finish()
    }
}

/// Read the configured API key env vars.
///
/// The grounded backend key is required. The keyword backend key is optional;
/// without it the keyword passes run empty and escalation fills the buckets.
pub fn resolve_api_keys(config: &AppConfig) -> Result<ApiKeys> {
    let grounded_var = &config.grounded_search.api_key_env;
    let grounded = read_env(grounded_var).ok_or_else(|| {
        DealScoutError::config(format!(
            "grounded search API key not found. Set the {grounded_var} environment variable."
        ))
    })?;

    let keyword = read_env(&config.keyword_search.api_key_env);
    if keyword.is_none() {
        tracing::info!(
            var = %config.keyword_search.api_key_env,
            "keyword search key not set, keyword passes will be skipped"
        );
    }

    Ok(ApiKeys { keyword, grounded })
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub min_bucket_size: usize,
    pub min_total_profiles: usize,
    pub profile_host: String,
    pub validate_links: bool,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_bucket_size: config.defaults.min_bucket_size,
            min_total_profiles: config.defaults.min_total_profiles,
            profile_host: config.defaults.profile_host.clone(),
            validate_links: config.validation.enabled,
        }
    }
}

impl KeywordSearchConfig {
    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms)
    }
}

impl GroundedSearchConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.dealscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DealScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.dealscout/dealscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DealScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DealScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DealScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DealScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DealScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("TAVILY_API_KEY"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(toml_str.contains("min_bucket_size = 5"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
min_bucket_size = 8

[grounded_search]
model = "gemini-2.5-pro"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.min_bucket_size, 8);
        assert_eq!(config.defaults.min_total_profiles, 3);
        assert_eq!(config.grounded_search.model, "gemini-2.5-pro");
        assert_eq!(config.grounded_search.max_output_tokens, 8192);
        assert_eq!(config.keyword_search.max_results, 5);
        assert!(config.validation.enabled);
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let mut app = AppConfig::default();
        app.validation.enabled = false;
        let pipeline = PipelineConfig::from(&app);
        assert_eq!(pipeline.min_bucket_size, 5);
        assert_eq!(pipeline.min_total_profiles, 3);
        assert_eq!(pipeline.profile_host, "linkedin.com");
        assert!(!pipeline.validate_links);
    }

    #[test]
    fn missing_grounded_key_is_config_error() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.grounded_search.api_key_env = "DS_TEST_NONEXISTENT_KEY_48213".into();
        let result = resolve_api_keys(&config);
        assert!(result.unwrap_err().to_string().contains("DS_TEST_NONEXISTENT_KEY_48213"));
    }

    #[test]
    fn api_keys_debug_is_redacted() {
        let keys = ApiKeys {
            keyword: Some("tvly-secret".into()),
            grounded: "g-secret".into(),
        };
        let rendered = format!("{keys:?}");
        assert!(!rendered.contains("secret"));
    }
}
