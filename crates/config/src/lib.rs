//! Configuration loading, validation, and management for Switchyard.
//!
//! Loads configuration from `~/.switchyard/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use switchyard_core::{Engine, ErrorClass, ErrorType};

/// The root configuration structure.
///
/// Maps directly to `~/.switchyard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine used when no override, profile, or rule matches
    #[serde(default = "default_engine")]
    pub default_engine: Engine,

    /// Rule-engine decision cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// AI advisor settings
    #[serde(default)]
    pub advisor: AdvisorConfig,

    /// Fallback policy
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Per-module engine profiles, keyed by module name
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,

    /// Test-identifier overrides, checked before everything else
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,

    /// The decision matrix
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

fn default_engine() -> Engine {
    Engine::Playwright
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_capacity() -> usize {
    1000
}
fn default_cache_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Total attempts per query, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay; attempt `n` waits `retry_delay_ms * 2^n`
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-call timeout
    #[serde(default = "default_advisor_timeout")]
    pub timeout_secs: u64,

    /// Recommendations below this confidence are ignored
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: u8,

    #[serde(default = "default_advisor_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_advisor_timeout() -> u64 {
    30
}
fn default_confidence_threshold() -> u8 {
    70
}
fn default_advisor_cache_capacity() -> usize {
    500
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_advisor_timeout(),
            confidence_threshold: default_confidence_threshold(),
            cache_capacity: default_advisor_cache_capacity(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

/// When a failed attempt is retried on the alternate engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Error types that trigger a fallback
    #[serde(default = "default_trigger_conditions")]
    pub trigger_conditions: Vec<ErrorType>,

    /// Error types that never trigger a fallback; wins over `trigger_conditions`
    #[serde(default = "default_non_trigger_conditions")]
    pub non_trigger_conditions: Vec<ErrorType>,
}

fn default_trigger_conditions() -> Vec<ErrorType> {
    ErrorType::of_class(ErrorClass::Infra)
}
fn default_non_trigger_conditions() -> Vec<ErrorType> {
    let mut types = ErrorType::of_class(ErrorClass::Application);
    types.push(ErrorType::Unknown);
    types
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_conditions: default_trigger_conditions(),
            non_trigger_conditions: default_non_trigger_conditions(),
        }
    }
}

/// Engine preference for every test in one module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub engine: Engine,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_engine: Option<Engine>,
}

/// Pin a test (or a wildcard family of tests) to an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Exact identifier, or a pattern with `*` wildcards
    pub pattern: String,

    pub engine: Engine,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One entry of the decision matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Unique rule name
    pub name: String,

    /// Conjunction of predicates: metadata key → expected value
    pub condition: BTreeMap<String, Value>,

    pub engine: Engine,

    /// Confidence in `[0, 100]`
    pub confidence: u8,

    #[serde(default)]
    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_engine: Option<Engine>,

    /// Priority in `[0, 100]` (higher = evaluated first)
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    50
}

fn rule(
    name: &str,
    condition: &[(&str, Value)],
    engine: Engine,
    confidence: u8,
    reason: &str,
    priority: u8,
) -> RuleConfig {
    RuleConfig {
        name: name.into(),
        condition: condition
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        engine,
        confidence,
        reason: reason.into(),
        fallback_engine: Some(engine.alternate()),
        priority,
    }
}

fn default_rules() -> Vec<RuleConfig> {
    use serde_json::json;

    vec![
        rule(
            "modern_spa",
            &[("modern_spa", json!(true))],
            Engine::Playwright,
            90,
            "Modern SPA benefits from auto-waiting and network control",
            80,
        ),
        rule(
            "legacy_application",
            &[("legacy", json!(true))],
            Engine::Selenium,
            85,
            "Legacy application is most stable on real WebDriver",
            75,
        ),
        rule(
            "enterprise_sso",
            &[("auth_type", json!(["saml", "kerberos", "ntlm"]))],
            Engine::Selenium,
            80,
            "Enterprise SSO flows need a full browser profile",
            70,
        ),
        rule(
            "smoke_suite",
            &[("tags", json!(["smoke", "critical"]))],
            Engine::Playwright,
            75,
            "Smoke tests favour fast headless execution",
            60,
        ),
        rule(
            "long_running",
            &[("expected_duration", json!(">=30m"))],
            Engine::Selenium,
            65,
            "Long-running flows run on the grid",
            40,
        ),
        rule(
            "catch_all",
            &[("default", json!(true))],
            Engine::Playwright,
            60,
            "Default engine for unclassified tests",
            0,
        ),
    ]
}

impl AppConfig {
    /// Load configuration from the default path (~/.switchyard/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SWITCHYARD_DEFAULT_ENGINE`
    /// - `SWITCHYARD_AI_ENABLED`
    /// - `SWITCHYARD_FALLBACK_ENABLED`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(engine) = lookup("SWITCHYARD_DEFAULT_ENGINE") {
            self.default_engine = engine.parse().map_err(|e: String| {
                ConfigError::ValidationError(format!("SWITCHYARD_DEFAULT_ENGINE: {e}"))
            })?;
        }
        if let Some(flag) = lookup("SWITCHYARD_AI_ENABLED") {
            self.advisor.enabled = parse_flag("SWITCHYARD_AI_ENABLED", &flag)?;
        }
        if let Some(flag) = lookup("SWITCHYARD_FALLBACK_ENABLED") {
            self.fallback.enabled = parse_flag("SWITCHYARD_FALLBACK_ENABLED", &flag)?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".switchyard")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.capacity must be > 0".into(),
            ));
        }
        if self.advisor.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "advisor.max_retries must be >= 1".into(),
            ));
        }
        if self.advisor.confidence_threshold > 100 {
            return Err(ConfigError::ValidationError(
                "advisor.confidence_threshold must be between 0 and 100".into(),
            ));
        }
        if self.advisor.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "advisor.timeout_secs must be > 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "rule name cannot be empty".into(),
                ));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate rule name '{}'",
                    rule.name
                )));
            }
            if rule.condition.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "rule '{}' has an empty condition (use default = true for a catch-all)",
                    rule.name
                )));
            }
            if rule.confidence > 100 || rule.priority > 100 {
                return Err(ConfigError::ValidationError(format!(
                    "rule '{}': confidence and priority must be between 0 and 100",
                    rule.name
                )));
            }
        }

        for o in &self.overrides {
            if o.pattern.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "override pattern cannot be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_engine: default_engine(),
            cache: CacheConfig::default(),
            advisor: AdvisorConfig::default(),
            fallback: FallbackConfig::default(),
            profiles: BTreeMap::new(),
            overrides: vec![],
            rules: default_rules(),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ValidationError(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
