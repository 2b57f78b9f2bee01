//! Client session configuration.
//!
//! Configures the master address, optional filer addresses, the HTTP
//! timeout, and the bounds of the location cache. Defaults target a local
//! single-node cluster. Override via environment variables or explicit
//! construction.

use std::num::NonZeroUsize;
use std::time::Duration;

use url::Url;
use weedo_core::normalize_address;

/// Default number of volumes whose locations are cached.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for a [`WeedClient`](crate::WeedClient) session.
#[derive(Debug, Clone)]
pub struct WeedConfig {
    /// Base URL of the master (directory service).
    pub master_url: Url,
    /// Base URLs of known filers.
    pub filer_urls: Vec<Url>,
    /// Request timeout in seconds, applied to every outbound call.
    pub timeout_secs: u64,
    /// Maximum number of volumes kept in the location cache.
    pub cache_capacity: NonZeroUsize,
    /// Maximum age of a cached location entry. `None` keeps entries until
    /// they are evicted by capacity or explicitly invalidated.
    pub cache_ttl: Option<Duration>,
}

impl WeedConfig {
    /// Configuration for the given master address with default settings.
    ///
    /// The address may omit its scheme (`localhost:9333`).
    pub fn new(master: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            master_url: parse_base_url("master", master)?,
            filer_urls: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_capacity: default_capacity(),
            cache_ttl: None,
        })
    }

    /// Add a filer address.
    pub fn with_filer(mut self, filer: &str) -> Result<Self, ConfigError> {
        self.filer_urls.push(parse_base_url("filer", filer)?);
        Ok(self)
    }

    /// Point at a different master, keeping every other setting.
    pub fn with_master(mut self, master: &str) -> Result<Self, ConfigError> {
        self.master_url = parse_base_url("master", master)?;
        Ok(self)
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `WEED_MASTER_URL` (default: `http://localhost:9333`)
    /// - `WEED_FILER_URLS` (comma-separated, default: none)
    /// - `WEED_TIMEOUT_SECS` (default: 30)
    /// - `WEED_LOCATION_CACHE_CAPACITY` (default: 1024, must be non-zero)
    /// - `WEED_LOCATION_CACHE_TTL_SECS` (default: unset, no expiry)
    pub fn from_env() -> Result<Self, ConfigError> {
        let master = std::env::var("WEED_MASTER_URL")
            .unwrap_or_else(|_| "http://localhost:9333".to_string());

        let filer_urls = match std::env::var("WEED_FILER_URLS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_base_url("WEED_FILER_URLS", s))
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };

        let cache_capacity = match env_number("WEED_LOCATION_CACHE_CAPACITY")? {
            Some(n) => cache_capacity(n)?,
            None => default_capacity(),
        };

        Ok(Self {
            master_url: parse_base_url("WEED_MASTER_URL", &master)?,
            filer_urls,
            timeout_secs: env_number("WEED_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            cache_capacity,
            cache_ttl: env_number("WEED_LOCATION_CACHE_TTL_SECS")?.map(Duration::from_secs),
        })
    }

    /// Configuration pointing at a master on localhost (for testing).
    pub fn local(master_port: u16) -> Result<Self, ConfigError> {
        let mut cfg = Self::new(&format!("127.0.0.1:{master_port}"))?;
        cfg.timeout_secs = 5;
        Ok(cfg)
    }
}

fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

/// Parse a base URL, adding `http://` when the scheme is missing.
pub(crate) fn parse_base_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(&normalize_address(raw))
        .map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn cache_capacity(n: u64) -> Result<NonZeroUsize, ConfigError> {
    let n = usize::try_from(n).map_err(|_| {
        ConfigError::InvalidNumber("WEED_LOCATION_CACHE_CAPACITY".to_string(), n.to_string())
    })?;
    NonZeroUsize::new(n).ok_or(ConfigError::ZeroCapacity)
}

fn env_number(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: \"{1}\"")]
    InvalidNumber(String, String),
    #[error("WEED_LOCATION_CACHE_CAPACITY must be greater than zero")]
    ZeroCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_builds_valid_config() {
        let cfg = WeedConfig::local(9333).unwrap();
        assert_eq!(cfg.master_url.as_str(), "http://127.0.0.1:9333/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.cache_capacity.get(), DEFAULT_CACHE_CAPACITY);
        assert!(cfg.cache_ttl.is_none());
    }

    #[test]
    fn scheme_less_master_gets_http() {
        let cfg = WeedConfig::new("localhost:9334").unwrap();
        assert_eq!(cfg.master_url.as_str(), "http://localhost:9334/");
    }

    #[test]
    fn with_filer_appends() {
        let cfg = WeedConfig::new("localhost:9333")
            .unwrap()
            .with_filer("localhost:8888")
            .unwrap();
        assert_eq!(cfg.filer_urls.len(), 1);
        assert_eq!(cfg.filer_urls[0].as_str(), "http://localhost:8888/");
    }

    #[test]
    fn with_master_keeps_other_settings() {
        let cfg = WeedConfig::local(9333)
            .unwrap()
            .with_master("weed-master:9333")
            .unwrap();
        assert_eq!(cfg.master_url.as_str(), "http://weed-master:9333/");
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn parse_base_url_rejects_garbage() {
        assert!(parse_base_url("master", "http://[::1").is_err());
    }

    #[test]
    fn env_number_absent_is_none() {
        assert_eq!(env_number("WEEDO_NONEXISTENT_VAR_12345").unwrap(), None);
    }

    #[test]
    fn cache_capacity_bounds() {
        assert_eq!(cache_capacity(16).unwrap().get(), 16);
        assert!(matches!(cache_capacity(0), Err(ConfigError::ZeroCapacity)));
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn cache_capacity_beyond_usize_is_rejected() {
        assert!(matches!(
            cache_capacity(u64::MAX),
            Err(ConfigError::InvalidNumber(..))
        ));
    }

    #[test]
    fn env_number_rejects_non_numeric() {
        std::env::set_var("WEEDO_TEST_BAD_NUMBER", "ten");
        let result = env_number("WEEDO_TEST_BAD_NUMBER");
        std::env::remove_var("WEEDO_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::InvalidNumber(..))));
    }
}
