//! Configuration module for environment variable parsing.
//!
//! Credentials and URLs have no safe defaults, so a missing value is an error
//! rather than a silent fallback. Tuning knobs fall back to defaults with a warning.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::web::signature::{SignatureAlgorithm, SignatureVerifier};

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("unknown signature algorithm {0:?} (expected \"sha1\" or \"sha256\")")]
    InvalidAlgorithm(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Bearer token used for Connect API requests
    pub square_access_token: String,

    /// Webhook signature key from the application dashboard
    pub webhook_signature_key: String,

    /// Notification URL registered with Square; part of the signed message
    pub webhook_url: String,

    /// Base URL for every Connect API request
    pub connect_host: Url,

    /// Algorithm used to sign notifications
    pub signature_algorithm: SignatureAlgorithm,

    /// Directory receiving the daily CSV exports
    pub export_dir: PathBuf,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Attempts per payment fetch, including the first one
    pub fetch_max_attempts: u32,

    /// Delay range in milliseconds between fetch attempts (min, max)
    pub fetch_retry_delay_ms: (u64, u64),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = required("WEBHOOK_URL")?;
        Url::parse(&webhook_url).map_err(|source| ConfigError::InvalidUrl {
            name: "WEBHOOK_URL",
            source,
        })?;

        let connect_host = Url::parse(&required("CONNECT_HOST")?).map_err(|source| {
            ConfigError::InvalidUrl {
                name: "CONNECT_HOST",
                source,
            }
        })?;

        let signature_algorithm = signature_algorithm()?;

        Ok(Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            square_access_token: required("SQUARE_ACCESS_TOKEN")?,

            webhook_signature_key: required("WEBHOOK_SIGNATURE_KEY")?,

            webhook_url,

            connect_host,

            signature_algorithm,

            export_dir: env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),

            request_timeout_ms: parse_number("REQUEST_TIMEOUT_MS", 8000),

            fetch_max_attempts: parse_number("FETCH_MAX_ATTEMPTS", 1).max(1),

            fetch_retry_delay_ms: parse_range("FETCH_RETRY_DELAY_RANGE_MS", (200, 1000)),
        })
    }
}

/// Load only the signing settings, read the same way [`Config::from_env`]
/// reads them, so a locally computed signature matches the server's.
pub fn signer_from_env() -> Result<SignatureVerifier, ConfigError> {
    Ok(SignatureVerifier::new(
        required("WEBHOOK_SIGNATURE_KEY")?,
        required("WEBHOOK_URL")?,
        signature_algorithm()?,
    ))
}

fn signature_algorithm() -> Result<SignatureAlgorithm, ConfigError> {
    match env::var("WEBHOOK_SIGNATURE_ALGORITHM") {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidAlgorithm(raw)),
        Err(_) => Ok(SignatureAlgorithm::default()),
    }
}

/// Read a variable that must be present and non-blank.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Parse a comma-separated range like "200,1000" into a tuple.
fn parse_range(name: &str, default: (u64, u64)) -> (u64, u64) {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        warn!(env_var = name, value = %raw, "Invalid range format, using default");
        return default;
    }

    let min = parts[0].trim().parse::<u64>();
    let max = parts[1].trim().parse::<u64>();

    match (min, max) {
        (Ok(min), Ok(max)) if min <= max => (min, max),
        _ => {
            warn!(env_var = name, value = %raw, "Invalid range values, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // from_env tests share process-wide variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const REQUIRED: [(&str, &str); 4] = [
        ("SQUARE_ACCESS_TOKEN", "token-123"),
        ("WEBHOOK_SIGNATURE_KEY", "signature-key"),
        ("WEBHOOK_URL", "https://example.com/webhooks/square"),
        ("CONNECT_HOST", "https://connect.squareup.com"),
    ];

    fn set_required() {
        for (name, value) in REQUIRED {
            env::set_var(name, value);
        }
    }

    fn clear_all() {
        for (name, _) in REQUIRED {
            env::remove_var(name);
        }
        env::remove_var("WEBHOOK_SIGNATURE_ALGORITHM");
        env::remove_var("FETCH_MAX_ATTEMPTS");
    }

    #[test]
    fn test_from_env_complete() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_required();
        env::set_var("WEBHOOK_SIGNATURE_ALGORITHM", "sha256");
        env::set_var("FETCH_MAX_ATTEMPTS", "0");

        let config = Config::from_env().unwrap();
        clear_all();

        assert_eq!(config.square_access_token, "token-123");
        assert_eq!(config.webhook_url, "https://example.com/webhooks/square");
        assert_eq!(config.connect_host.as_str(), "https://connect.squareup.com/");
        assert_eq!(config.signature_algorithm, SignatureAlgorithm::HmacSha256);
        assert_eq!(config.fetch_max_attempts, 1);
    }

    #[test]
    fn test_signer_from_env_trims_like_server() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_required();
        env::set_var("WEBHOOK_SIGNATURE_KEY", "  signature-key\n");
        env::set_var("WEBHOOK_URL", " https://example.com/webhooks/square ");

        let signer = signer_from_env().unwrap();
        let config = Config::from_env().unwrap();
        clear_all();

        let body = br#"{"event_type":"PAYMENT_UPDATED"}"#;
        let expected = crate::web::signature::sign(
            body,
            "signature-key",
            "https://example.com/webhooks/square",
        )
        .unwrap();
        assert_eq!(signer.sign(body).unwrap(), expected);
        assert_eq!(config.webhook_signature_key, "signature-key");
        assert!(signer.verify(body, &expected));
    }

    #[test]
    fn test_signer_from_env_missing_key() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_all();
        env::set_var("WEBHOOK_URL", "https://example.com/webhooks/square");

        let result = signer_from_env();
        clear_all();

        assert!(matches!(
            result,
            Err(ConfigError::Missing("WEBHOOK_SIGNATURE_KEY"))
        ));
    }

    #[test]
    fn test_from_env_missing_secret() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_required();
        env::set_var("WEBHOOK_SIGNATURE_KEY", "   ");

        let result = Config::from_env();
        clear_all();

        assert!(matches!(
            result,
            Err(ConfigError::Missing("WEBHOOK_SIGNATURE_KEY"))
        ));
    }

    #[test]
    fn test_from_env_invalid_host() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_required();
        env::set_var("CONNECT_HOST", "not a url");

        let result = Config::from_env();
        clear_all();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                name: "CONNECT_HOST",
                ..
            })
        ));
    }

    #[test]
    fn test_from_env_unknown_algorithm() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_required();
        env::set_var("WEBHOOK_SIGNATURE_ALGORITHM", "md5");

        let result = Config::from_env();
        clear_all();

        assert!(matches!(result, Err(ConfigError::InvalidAlgorithm(a)) if a == "md5"));
    }

    #[test]
    fn test_parse_range_valid() {
        env::set_var("TEST_RANGE", "100,500");
        let result = parse_range("TEST_RANGE", (0, 0));
        assert_eq!(result, (100, 500));
        env::remove_var("TEST_RANGE");
    }

    #[test]
    fn test_parse_range_inverted() {
        env::set_var("TEST_RANGE_INVERTED", "500,100");
        let result = parse_range("TEST_RANGE_INVERTED", (10, 20));
        assert_eq!(result, (10, 20));
        env::remove_var("TEST_RANGE_INVERTED");
    }

    #[test]
    fn test_parse_number_default() {
        env::set_var("TEST_NUMBER", "abc");
        assert_eq!(parse_number("TEST_NUMBER", 42u64), 42);
        env::remove_var("TEST_NUMBER");
        assert_eq!(parse_number("NONEXISTENT_NUMBER", 7u32), 7);
    }
}
