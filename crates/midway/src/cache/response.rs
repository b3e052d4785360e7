//! Serializable snapshot of a response

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CacheError, CacheResult};
use crate::middleware::Response;

/// A response as stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,
    /// Header fields in order; names may repeat
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
    /// When the snapshot was taken
    pub created: DateTime<Utc>,
}

impl CachedResponse {
    /// Snapshot a response. Header values that are not valid text are skipped.
    pub fn from_response(response: &Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Self {
            status: response.status().as_u16(),
            headers,
            body: response.body().to_vec(),
            created: Utc::now(),
        }
    }

    /// Rebuild a response
    pub fn to_response(&self) -> CacheResult<Response> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Bytes::from(self.body.clone()))
            .map_err(|e| CacheError::InvalidResponse(e.to_string()))
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize for storage
    pub fn to_json(&self) -> CacheResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from storage
    pub fn from_json(json: &str) -> CacheResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn sample() -> Response {
        http::Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "text/plain")
            .header("Set-Cookie", "a=1")
            .header("Set-Cookie", "b=2")
            .body(Bytes::from_static(b"hello"))
            .expect("valid response")
    }

    #[test]
    fn test_snapshot_keeps_status_headers_body() {
        let cached = CachedResponse::from_response(&sample());
        assert_eq!(cached.status, 201);
        assert_eq!(cached.body, b"hello");
        assert_eq!(cached.header("content-type"), Some("text/plain"));
        assert_eq!(cached.header("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(
            cached.headers.iter().filter(|(n, _)| n == "set-cookie").count(),
            2
        );
    }

    #[test]
    fn test_rebuilt_response_matches() {
        let cached = CachedResponse::from_response(&sample());
        let response = cached.to_response().expect("valid snapshot");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), b"hello");
        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }

    #[test]
    fn test_json_storage_format() {
        let cached = CachedResponse::from_response(&sample());
        let json = cached.to_json().expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["status"], 201);
        assert_eq!(value["headers"][0][0], "content-type");
        assert_eq!(CachedResponse::from_json(&json).expect("parses back"), cached);
    }

    #[test]
    fn test_invalid_snapshot_is_rejected() {
        let cached = CachedResponse {
            status: 42,
            headers: Vec::new(),
            body: Vec::new(),
            created: Utc::now(),
        };
        assert!(matches!(cached.to_response(), Err(CacheError::InvalidResponse(_))));
        assert!(matches!(
            CachedResponse::from_json("{}"),
            Err(CacheError::SerializationError(_))
        ));
    }
}
