//! Configuration errors

/// Errors raised when a middleware configuration is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A header name is not a valid HTTP header name
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// A length or capacity must be positive
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    /// A required string setting is empty
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Parse a configured header name
pub(crate) fn header_name(name: &str) -> ConfigResult<http::HeaderName> {
    http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::InvalidHeaderName("bad header".into()).to_string(),
            "invalid header name: \"bad header\""
        );
        assert_eq!(
            ConfigError::NotPositive("length").to_string(),
            "length must be greater than zero"
        );
        assert_eq!(ConfigError::Empty("header_name").to_string(), "header_name cannot be empty");
    }

    #[test]
    fn test_header_name_is_lowercased() {
        let name = header_name("X-Request-ID").expect("valid header name");
        assert_eq!(name.as_str(), "x-request-id");
        assert!(header_name("bad header").is_err());
    }

    #[test]
    fn test_config_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
