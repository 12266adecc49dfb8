use crate::FitSyncError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub dark_mode: bool,
    pub compact: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dark_mode: false,
            compact: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, FitSyncError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, FitSyncError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = get("FIT_SYNC_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let api_token = get("FIT_SYNC_API_TOKEN")
            .filter(|s| !s.is_empty())
            .map(|t| SecretString::new(t.into()));
        let poll_interval = match get("FIT_SYNC_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_positive("FIT_SYNC_POLL_INTERVAL_MS", &raw)?),
            None => DEFAULT_POLL_INTERVAL,
        };
        let request_timeout = match get("FIT_SYNC_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("FIT_SYNC_REQUEST_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };
        let dark_mode = parse_flag("FIT_SYNC_DARK_MODE", get("FIT_SYNC_DARK_MODE"))?;
        let compact = parse_flag("FIT_SYNC_COMPACT", get("FIT_SYNC_COMPACT"))?;
        Ok(Self {
            base_url,
            api_token,
            poll_interval,
            request_timeout,
            dark_mode,
            compact,
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, FitSyncError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(FitSyncError::Config(format!("{key} must be greater than zero"))),
        Ok(v) => Ok(v),
        Err(_) => Err(FitSyncError::Config(format!("{key} is not a number: {raw}"))),
    }
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool, FitSyncError> {
    let Some(raw) = raw else { return Ok(false) };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(FitSyncError::Config(format!("{key} is not a boolean: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn from_env_defaults_when_unset() {
        let cfg = Config::from_env_with(|_| None).expect("cfg");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert!(cfg.api_token.is_none());
        assert_eq!(cfg.poll_interval, Duration::from_millis(5000));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert!(!cfg.dark_mode);
        assert!(!cfg.compact);
    }

    #[test]
    fn from_env_reads_values() {
        let get = |k: &str| match k {
            "FIT_SYNC_BASE_URL" => Some("http://localhost:8080".into()),
            "FIT_SYNC_API_TOKEN" => Some("sekrit".into()),
            "FIT_SYNC_POLL_INTERVAL_MS" => Some("250".into()),
            "FIT_SYNC_REQUEST_TIMEOUT_SECS" => Some("5".into()),
            "FIT_SYNC_DARK_MODE" => Some("true".into()),
            "FIT_SYNC_COMPACT" => Some("1".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.api_token.unwrap().expose_secret(), "sekrit");
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert!(cfg.dark_mode);
        assert!(cfg.compact);
    }

    #[test]
    fn from_env_rejects_zero_interval() {
        let get = |k: &str| (k == "FIT_SYNC_POLL_INTERVAL_MS").then(|| "0".to_string());
        let res = Config::from_env_with(get);
        assert!(matches!(res, Err(FitSyncError::Config(_))));
    }

    #[test]
    fn from_env_rejects_bad_flag() {
        let get = |k: &str| (k == "FIT_SYNC_DARK_MODE").then(|| "maybe".to_string());
        assert!(Config::from_env_with(get).is_err());
    }

    #[test]
    fn debug_output_hides_token() {
        let get = |k: &str| (k == "FIT_SYNC_API_TOKEN").then(|| "sekrit".to_string());
        let cfg = Config::from_env_with(get).expect("cfg");
        assert!(!format!("{cfg:?}").contains("sekrit"));
    }
}
