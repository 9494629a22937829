use chrono::Datelike;
use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the ranking core and its wiring.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub completion: CompletionConfig,
    pub scoring: ScoringConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let defaults = CompletionConfig::default();
        let completion = CompletionConfig {
            base_url: env::var("APP_COMPLETION_URL").unwrap_or(defaults.base_url),
            enrichment_model: env::var("APP_ENRICHMENT_MODEL").unwrap_or(defaults.enrichment_model),
            audit_model: env::var("APP_AUDIT_MODEL").unwrap_or(defaults.audit_model),
            enrichment_timeout: timeout_var(
                "APP_ENRICHMENT_TIMEOUT_SECS",
                defaults.enrichment_timeout,
            )?,
            audit_timeout: timeout_var("APP_AUDIT_TIMEOUT_SECS", defaults.audit_timeout)?,
            temperature: parsed_var("APP_COMPLETION_TEMPERATURE", defaults.temperature)?,
            enrichment_max_tokens: parsed_var(
                "APP_ENRICHMENT_MAX_TOKENS",
                defaults.enrichment_max_tokens,
            )?,
            audit_max_tokens: parsed_var("APP_AUDIT_MAX_TOKENS", defaults.audit_max_tokens)?,
        };

        let reference_year = parsed_var(
            "APP_SCORING_REFERENCE_YEAR",
            chrono::Local::now().year(),
        )?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            completion,
            scoring: ScoringConfig { reference_year },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parsed_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn timeout_var(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let secs = parsed_var(key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::ZeroTimeout { key });
    }
    Ok(Duration::from_secs(secs))
}

/// Settings for the external text-completion service used by enrichment and audit.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub base_url: String,
    pub enrichment_model: String,
    pub audit_model: String,
    pub enrichment_timeout: Duration,
    pub audit_timeout: Duration,
    pub temperature: f32,
    pub enrichment_max_tokens: u32,
    pub audit_max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            enrichment_model: "mistral".to_string(),
            audit_model: "mistral".to_string(),
            enrichment_timeout: Duration::from_secs(15),
            audit_timeout: Duration::from_secs(60),
            temperature: 0.1,
            enrichment_max_tokens: 800,
            audit_max_tokens: 1500,
        }
    }
}

/// Inputs to the scoring rubric that are not part of a candidate or requirement.
///
/// `reference_year` stands in for "now" when judging how recent an experience is;
/// it is fixed once per config so identical inputs always score identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    pub reference_year: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reference_year: 2026,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    ZeroTimeout { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be numeric (found '{value}')")
            }
            ConfigError::ZeroTimeout { key } => write!(f, "{key} must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}
