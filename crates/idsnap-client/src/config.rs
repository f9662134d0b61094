use idsnap_core::intake::{AcceptPattern, IntakeConfig, DEFAULT_ACCEPT};
use std::time::Duration;

/// Base origin used when `IDSNAP_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration, loaded once at startup from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Recognition service origin, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Intake size limit in MiB.
    pub max_upload_mb: u64,
    /// Intake accept pattern (HTML `accept` syntax).
    pub accept: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            max_upload_mb: 10,
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `IDSNAP_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("IDSNAP_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        Self {
            api_url,
            request_timeout_secs: parse_or(
                &lookup,
                "IDSNAP_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            max_upload_mb: parse_or(&lookup, "IDSNAP_MAX_UPLOAD_MB", defaults.max_upload_mb),
            accept: lookup("IDSNAP_ACCEPT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.accept),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `POST` target for recognition.
    pub fn recognize_url(&self) -> String {
        format!("{}/recognize", self.api_url)
    }

    /// `POST` target for enrollment.
    pub fn add_user_url(&self) -> String {
        format!("{}/add_user", self.api_url)
    }

    /// Intake limits derived from this configuration.
    pub fn intake_config(&self) -> IntakeConfig {
        IntakeConfig {
            max_size_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
            accept: AcceptPattern::parse(&self.accept),
            preview: true,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
