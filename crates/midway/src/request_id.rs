//! Request ID middleware
//!
//! Ensures every request carries an ID header before it reaches inner
//! handlers. Existing IDs are kept untouched.

use crate::error::{ConfigError, ConfigResult, header_name};
use crate::middleware::{Handler, Middleware, Request, handler_fn, middleware_fn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default request ID header
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Default length of generated IDs
pub const DEFAULT_ID_LENGTH: usize = 20;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Configuration for [`handle_request_id`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestIdConfig {
    /// Header carrying the ID
    pub header_name: String,
    /// Number of letters in a generated ID
    pub length: usize,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            header_name: REQUEST_ID_HEADER.to_string(),
            length: DEFAULT_ID_LENGTH,
        }
    }
}

impl RequestIdConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header carrying the ID
    #[must_use = "This method returns a new RequestIdConfig and does not modify self"]
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set the generated ID length
    #[must_use = "This method returns a new RequestIdConfig and does not modify self"]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.length == 0 {
            return Err(ConfigError::NotPositive("length"));
        }
        if self.header_name.is_empty() {
            return Err(ConfigError::Empty("header_name"));
        }
        header_name(&self.header_name).map(|_| ())
    }
}

/// Generate a random ID of ASCII letters
pub fn generate_id(length: usize) -> String {
    let mut id = String::with_capacity(length);
    while id.len() < length {
        let seed = Uuid::new_v4();
        for byte in seed.as_bytes().iter().take(length - id.len()) {
            id.push(LETTERS[*byte as usize % LETTERS.len()] as char);
        }
    }
    id
}

/// Middleware that sets the request ID header when it is missing or empty.
pub fn handle_request_id(config: RequestIdConfig) -> ConfigResult<Middleware> {
    config.validate()?;
    let name = header_name(&config.header_name)?;
    let length = config.length;

    Ok(middleware_fn(move |inner: Handler| {
        let name = name.clone();
        handler_fn(move |mut req: Request| {
            let missing = req
                .headers()
                .get(&name)
                .is_none_or(|value| value.is_empty());
            if missing {
                let id = generate_id(length);
                tracing::trace!(request_id = %id, "assigned request id");
                if let Ok(value) = http::HeaderValue::from_str(&id) {
                    req.headers_mut().insert(name.clone(), value);
                }
            }
            inner(req)
        })
    }))
}

/// The request ID under the default header, if present
pub fn request_id<B>(req: &http::Request<B>) -> Option<&str> {
    request_id_from(req, REQUEST_ID_HEADER)
}

/// The request ID under a custom header, if present
pub fn request_id_from<'a, B>(req: &'a http::Request<B>, header: &str) -> Option<&'a str> {
    req.headers()
        .get(header)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_length_and_alphabet() {
        for length in [1, 16, 20, 64] {
            let id = generate_id(length);
            assert_eq!(id.len(), length);
            assert!(id.bytes().all(|b| b.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(generate_id(DEFAULT_ID_LENGTH), generate_id(DEFAULT_ID_LENGTH));
    }

    #[test]
    fn test_config_defaults_and_builders() {
        let config = RequestIdConfig::new();
        assert_eq!(config.header_name, "X-Request-ID");
        assert_eq!(config.length, 20);

        let config = config.with_header_name("X-Trace").with_length(8);
        assert_eq!(config.header_name, "X-Trace");
        assert_eq!(config.length, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            RequestIdConfig::new().with_length(0).validate(),
            Err(ConfigError::NotPositive("length"))
        );
        assert!(matches!(
            RequestIdConfig::new().with_header_name("not valid").validate(),
            Err(ConfigError::InvalidHeaderName(_))
        ));
        assert_eq!(
            RequestIdConfig::new().with_header_name("").validate(),
            Err(ConfigError::Empty("header_name"))
        );
    }

    #[test]
    fn test_config_deserializes_partial() {
        let config: RequestIdConfig = serde_json::from_str(r#"{"length":12}"#).expect("valid json");
        assert_eq!(config.length, 12);
        assert_eq!(config.header_name, REQUEST_ID_HEADER);
    }
}
