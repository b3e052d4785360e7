//! Read-through, write-behind response cache keyed by request path
//!
//! [`cached_handler`] serves a stored response while its expiry headers say
//! it is still fresh. Otherwise it runs the inner handler, returns that
//! response right away and stores a snapshot in a background task.
//!
//! # Freshness
//!
//! - `X-Grace-Expires` in the future keeps a response fresh regardless of
//!   `Expires`
//! - otherwise `Expires` in the future keeps it fresh
//! - anything else, including unparsable dates, is treated as expired
//!
//! # Example
//!
//! ```rust,ignore
//! use midway::cache::{cached_handler, CacheConfig, Cacher};
//!
//! let cacher = Cacher::memory(CacheConfig::new().with_max_entries(500))?;
//! let handler = cached_handler(cacher)(render_page);
//! ```
//!
//! # Tracing
//!
//! Cache decisions are written to the request's [`ComplexLogger`]; store
//! operations create spans at `trace`/`debug` level.

mod config;
mod error;
mod response;
mod store;

pub use config::{
    CacheConfig, DEFAULT_EXPIRATION, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ENTRIES, EXPIRES_HEADER,
    GRACE_HEADER,
};
pub use error::{CacheError, CacheResult};
pub use response::CachedResponse;
pub use store::{CacheStore, MemoryStore};

use chrono::{DateTime, NaiveDateTime, Utc, Weekday};
use std::sync::Arc;

use crate::logcontext::{ComplexLogger, get_complex_logger};
use crate::middleware::{Handler, Middleware, Request, handler_fn, middleware_fn};

// =============================================================================
// HTTP dates
// =============================================================================

/// RFC 1123 layout used by `Expires` and `X-Grace-Expires`
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// [`HTTP_DATE_FORMAT`] after the weekday
const HTTP_DATE_BODY_FORMAT: &str = "%d %b %Y %H:%M:%S GMT";

/// Parse an RFC 1123 date.
///
/// The trailing three-letter zone token is replaced by `GMT` before parsing,
/// so any zone name is read as UTC. The weekday must name a day but is not
/// checked against the date.
pub fn parse_http_date(value: &str) -> CacheResult<DateTime<Utc>> {
    let head = value
        .len()
        .checked_sub(3)
        .and_then(|end| value.get(..end))
        .ok_or_else(|| {
            CacheError::InvalidDate(format!("incorrect time string provided: {}", value))
        })?;
    let invalid = || {
        CacheError::InvalidDate(format!(
            "cannot parse time {:?} as RFC 1123 ({:?})",
            value, HTTP_DATE_FORMAT
        ))
    };

    let (weekday, body) = head.split_once(", ").ok_or_else(invalid)?;
    if weekday.len() != 3 || weekday.parse::<Weekday>().is_err() {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(&format!("{}GMT", body), HTTP_DATE_BODY_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| invalid())
}

/// Format a date for `Expires`-style headers
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

fn header_time(cached: &CachedResponse, name: &str) -> CacheResult<DateTime<Utc>> {
    match cached.header(name) {
        None | Some("") => Err(CacheError::HeaderNotExists),
        Some(value) => parse_http_date(value),
    }
}

// =============================================================================
// Freshness
// =============================================================================

fn header_is_future(
    cached: &CachedResponse,
    logger: &ComplexLogger,
    header: &str,
    now: DateTime<Utc>,
) -> bool {
    match header_time(cached, header) {
        Ok(expires) => expires > now,
        Err(CacheError::HeaderNotExists) => false,
        Err(e) => {
            logger.error(format!("error parsing {} ({})", header, e));
            false
        }
    }
}

fn check_fresh(cached: &CachedResponse, logger: &ComplexLogger, grace: &str, expires: &str) -> bool {
    let now = Utc::now();
    if header_is_future(cached, logger, grace, now) {
        logger.log("cache graced");
        return true;
    }
    if header_is_future(cached, logger, expires, now) {
        logger.log("cache not expired");
        return true;
    }
    false
}

/// Whether a cached response is still fresh, using the default header names.
pub fn is_valid(cached: &CachedResponse, logger: &ComplexLogger) -> bool {
    check_fresh(cached, logger, GRACE_HEADER, EXPIRES_HEADER)
}

// =============================================================================
// Cacher
// =============================================================================

/// Loads, saves and deletes cached responses in a [`CacheStore`]
#[derive(Clone)]
pub struct Cacher {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl Cacher {
    /// Create a cacher over `store`
    pub fn new(store: impl CacheStore + 'static, config: CacheConfig) -> CacheResult<Self> {
        Self::from_store(Arc::new(store), config)
    }

    /// Create a cacher over a shared store.
    ///
    /// Fails with [`CacheError::InvalidConfig`] when `config` does not
    /// [`validate`](CacheConfig::validate).
    pub fn from_store(store: Arc<dyn CacheStore>, config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Create a cacher over a [`MemoryStore`] sized by `config.max_entries`
    pub fn memory(config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Self::new(MemoryStore::new(config.max_entries), config)
    }

    /// The configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache key of a request
    pub fn key_of<B>(&self, req: &http::Request<B>) -> String {
        self.config.key_of(req.uri().path())
    }

    /// Load the cached response of a request, `None` if there is none
    pub async fn load_response<B>(&self, req: &http::Request<B>) -> CacheResult<Option<CachedResponse>> {
        self.load_key(&self.key_of(req)).await
    }

    /// Store a response for a request, expiring after `default_expiration`
    pub async fn save_response<B>(
        &self,
        req: &http::Request<B>,
        cached: &CachedResponse,
    ) -> CacheResult<()> {
        self.save_key(&self.key_of(req), cached).await
    }

    /// Delete the cached response of a request
    pub async fn delete_response<B>(&self, req: &http::Request<B>) -> CacheResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.store.delete(&self.key_of(req)).await
    }

    /// Whether a cached response is still fresh under the configured headers
    pub fn is_valid(&self, cached: &CachedResponse, logger: &ComplexLogger) -> bool {
        check_fresh(cached, logger, &self.config.grace_header, &self.config.expires_header)
    }

    async fn load_key(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        if !self.config.enabled {
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(json) => CachedResponse::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    async fn save_key(&self, key: &str, cached: &CachedResponse) -> CacheResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let json = cached.to_json()?;
        self.store
            .set(key, json, self.config.default_expiration)
            .await
    }
}

impl std::fmt::Debug for Cacher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cacher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Middleware serving fresh cached responses and refreshing stale ones.
///
/// Must run inside a tokio runtime: snapshots are saved with
/// [`tokio::spawn`] after the response is returned.
pub fn cached_handler(cacher: Cacher) -> Middleware {
    middleware_fn(move |inner: Handler| {
        let cacher = cacher.clone();
        handler_fn(move |req: Request| {
            let cacher = cacher.clone();
            let inner = inner.clone();
            async move {
                if !cacher.config.enabled {
                    tracing::trace!("cache disabled");
                    return inner(req).await;
                }

                let logger = get_complex_logger(&req);
                let key = cacher.key_of(&req);

                let cached = cacher.load_key(&key).await.unwrap_or_else(|e| {
                    logger.error(format!("error loading cache: {}", e));
                    None
                });

                if let Some(cached) = cached.filter(|c| cacher.is_valid(c, &logger)) {
                    match cached.to_response() {
                        Ok(response) => {
                            logger.log("use cache");
                            tracing::debug!(path = %req.uri().path(), "cache hit");
                            return response;
                        }
                        Err(e) => logger.error(format!("error restoring cache: {}", e)),
                    }
                }

                logger.log("no valid cache, trigger inner handler");
                tracing::debug!(path = %req.uri().path(), "cache miss");

                let response = inner(req).await;
                let snapshot = CachedResponse::from_response(&response);
                tokio::spawn(async move {
                    if let Err(e) = cacher.save_key(&key, &snapshot).await {
                        logger.error(format!("error saving cache: {}", e));
                    }
                });
                response
            }
        })
    })
}
