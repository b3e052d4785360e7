//! Response cache configuration

use std::time::Duration;

use super::error::{CacheError, CacheResult};

/// Default prefix of cache keys
pub const DEFAULT_KEY_PREFIX: &str = "page:/";

/// Default lifetime of a stored response (60 minutes)
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(60 * 60);

/// Default capacity of [`MemoryStore`](super::MemoryStore)
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Header that overrides `Expires` while it lies in the future
pub const GRACE_HEADER: &str = "X-Grace-Expires";

/// Standard expiry header
pub const EXPIRES_HEADER: &str = "Expires";

/// Configuration for the response cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Prepended to the request path to form the key
    pub key_prefix: String,
    /// Store lifetime of saved responses
    pub default_expiration: Duration,
    /// Capacity of the in-memory store
    pub max_entries: usize,
    /// Grace override header
    pub grace_header: String,
    /// Expiry header
    pub expires_header: String,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl CacheConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            default_expiration: DEFAULT_EXPIRATION,
            max_entries: DEFAULT_MAX_ENTRIES,
            grace_header: GRACE_HEADER.to_string(),
            expires_header: EXPIRES_HEADER.to_string(),
            enabled: true,
        }
    }

    /// Set the key prefix
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the store lifetime of saved responses
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_default_expiration(mut self, expiration: Duration) -> Self {
        self.default_expiration = expiration;
        self
    }

    /// Set the maximum number of entries
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the grace override header
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_grace_header(mut self, name: impl Into<String>) -> Self {
        self.grace_header = name.into();
        self
    }

    /// Set the expiry header
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_expires_header(mut self, name: impl Into<String>) -> Self {
        self.expires_header = name.into();
        self
    }

    /// Enable or disable caching
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> CacheResult<()> {
        if self.key_prefix.is_empty() {
            return Err(CacheError::InvalidConfig("key_prefix cannot be empty".into()));
        }
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be greater than zero".into(),
            ));
        }
        if self.default_expiration.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default_expiration must be greater than zero".into(),
            ));
        }
        for name in [&self.grace_header, &self.expires_header] {
            if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(CacheError::InvalidConfig(format!("invalid header name: {:?}", name)));
            }
        }
        Ok(())
    }

    /// Key of a request path
    pub fn key_of(&self, path: &str) -> String {
        format!("{}{}", self.key_prefix, path)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.key_prefix, "page:/");
        assert_eq!(config.default_expiration, Duration::from_secs(3600));
        assert_eq!(config.grace_header, "X-Grace-Expires");
        assert_eq!(config.expires_header, "Expires");
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_of_prepends_prefix() {
        let config = CacheConfig::new();
        assert_eq!(config.key_of("/hello/world"), "page://hello/world");
        assert_eq!(config.with_key_prefix("v2:").key_of("/a"), "v2:/a");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(CacheConfig::new().with_key_prefix("").validate().is_err());
        assert!(CacheConfig::new().with_max_entries(0).validate().is_err());
        assert!(
            CacheConfig::new()
                .with_default_expiration(Duration::ZERO)
                .validate()
                .is_err()
        );
        let err = CacheConfig::new()
            .with_grace_header("bad header")
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid cache configuration: invalid header name: \"bad header\""
        );
    }
}
