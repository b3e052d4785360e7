//! Loggers carried in request extensions
//!
//! A [`RequestLogger`] holds key/value context fields and forwards records to
//! a [`LogSink`]. Handlers read loggers back from the request with
//! [`get_logger`] and [`get_err_logger`]; both fall back to a default logger
//! that writes through `tracing`.
//!
//! # Example
//!
//! ```rust,ignore
//! use midway::logcontext::{apply_logger, get_logger, RequestLogger};
//!
//! let handler = apply_logger(RequestLogger::default)(handler_fn(|req: Request| async move {
//!     get_logger(&req).log("handling");
//!     text_response(StatusCode::OK, "done")
//! }));
//! ```

use crate::middleware::{Handler, Middleware, Request, handler_fn, middleware_fn};
use crate::request_id::{REQUEST_ID_HEADER, request_id_from};
use std::fmt;
use std::sync::Arc;
use tracing::Level;

// =============================================================================
// Records and sinks
// =============================================================================

/// One log line: a level and ordered key/value pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity
    pub level: Level,
    /// Context fields first, then the fields of this line
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Value of the first field named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Renders as logfmt: `key=value key="quoted value"`
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let bare = !value.is_empty()
                && !value.contains(|c: char| c.is_whitespace() || c == '=' || c == '"');
            if bare {
                write!(f, "{}={}", key, value)?;
            } else {
                write!(f, "{}={:?}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Destination of log records
pub trait LogSink: Send + Sync {
    /// Emit one record
    fn emit(&self, record: &LogRecord);
}

/// Default sink that writes records through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        if record.level == Level::ERROR {
            tracing::error!(target: "midway", "{}", record);
        } else if record.level == Level::WARN {
            tracing::warn!(target: "midway", "{}", record);
        } else if record.level == Level::INFO {
            tracing::info!(target: "midway", "{}", record);
        } else {
            tracing::debug!(target: "midway", "{}", record);
        }
    }
}

// =============================================================================
// RequestLogger
// =============================================================================

/// A logger with context fields.
///
/// Cloning is cheap. [`RequestLogger::with`] returns a child logger and
/// leaves the parent unchanged.
#[derive(Clone)]
pub struct RequestLogger {
    sink: Arc<dyn LogSink>,
    fields: Arc<[(String, String)]>,
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl RequestLogger {
    /// A logger writing to `sink` with no context fields
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self::from_sink(Arc::new(sink))
    }

    /// A logger writing to a shared sink
    pub fn from_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            fields: Arc::from(Vec::new()),
        }
    }

    /// Child logger with one more context field
    #[must_use = "This method returns a new RequestLogger and does not modify self"]
    pub fn with(&self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut fields = self.fields.to_vec();
        fields.push((key.into(), value.to_string()));
        Self {
            sink: Arc::clone(&self.sink),
            fields: fields.into(),
        }
    }

    /// Context fields, oldest first
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Emit an info line with a `message` field
    pub fn log(&self, message: impl fmt::Display) {
        self.emit(Level::INFO, &[("message", message.to_string())]);
    }

    /// Emit an error line with a `message` field
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Level::ERROR, &[("message", message.to_string())]);
    }

    /// Emit a line with arbitrary fields after the context fields
    pub fn emit(&self, level: Level, extra: &[(&str, String)]) {
        let fields = self
            .fields
            .iter()
            .cloned()
            .chain(extra.iter().map(|(k, v)| (k.to_string(), v.clone())))
            .collect();
        self.sink.emit(&LogRecord { level, fields });
    }

    /// Whether both loggers write to the same sink
    pub fn shares_sink(&self, other: &RequestLogger) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }
}

// =============================================================================
// Request extensions
// =============================================================================

#[derive(Clone)]
struct InfoLogger(RequestLogger);

#[derive(Clone)]
struct ErrLogger(RequestLogger);

/// Store the info logger on a request
pub fn with_logger<B>(req: &mut http::Request<B>, logger: RequestLogger) {
    req.extensions_mut().insert(InfoLogger(logger));
}

/// The info logger of a request, or a default logger
pub fn get_logger<B>(req: &http::Request<B>) -> RequestLogger {
    req.extensions()
        .get::<InfoLogger>()
        .map(|l| l.0.clone())
        .unwrap_or_default()
}

/// Store the error logger on a request
pub fn with_err_logger<B>(req: &mut http::Request<B>, logger: RequestLogger) {
    req.extensions_mut().insert(ErrLogger(logger));
}

/// The error logger of a request, or a default logger
pub fn get_err_logger<B>(req: &http::Request<B>) -> RequestLogger {
    req.extensions()
        .get::<ErrLogger>()
        .map(|l| l.0.clone())
        .unwrap_or_default()
}

// =============================================================================
// ComplexLogger
// =============================================================================

/// Routes info lines and error lines to separate loggers
#[derive(Debug, Clone, Default)]
pub struct ComplexLogger {
    info: RequestLogger,
    err: RequestLogger,
}

impl ComplexLogger {
    /// Pair an info logger with an error logger
    pub fn new(info: RequestLogger, err: RequestLogger) -> Self {
        Self { info, err }
    }

    /// Emit an info line
    pub fn log(&self, message: impl fmt::Display) {
        self.info.log(message);
    }

    /// Emit an error line on the error logger
    pub fn error(&self, message: impl fmt::Display) {
        self.err.error(message);
    }

    /// The info logger
    pub fn info_logger(&self) -> &RequestLogger {
        &self.info
    }

    /// The error logger
    pub fn err_logger(&self) -> &RequestLogger {
        &self.err
    }
}

/// Both loggers of a request
pub fn get_complex_logger<B>(req: &http::Request<B>) -> ComplexLogger {
    ComplexLogger::new(get_logger(req), get_err_logger(req))
}

// =============================================================================
// Middlewares
// =============================================================================

/// Middleware that stores `info` and `err` on every request
pub fn provide_loggers(info: RequestLogger, err: RequestLogger) -> Middleware {
    middleware_fn(move |inner: Handler| {
        let info = info.clone();
        let err = err.clone();
        handler_fn(move |mut req: Request| {
            with_logger(&mut req, info.clone());
            with_err_logger(&mut req, err.clone());
            inner(req)
        })
    })
}

/// Client address of a request, set by the server in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

/// Middleware that builds a logger per request.
///
/// The logger gets a `request_id` field from the request ID header, writes
/// one access line and is stored as the info logger for inner handlers.
pub fn apply_logger<F>(factory: F) -> Middleware
where
    F: Fn() -> RequestLogger + Send + Sync + 'static,
{
    apply_logger_with_header(REQUEST_ID_HEADER, factory)
}

/// [`apply_logger`] reading the request ID from `header`.
///
/// Pair with a [`handle_request_id`](crate::request_id::handle_request_id)
/// configured with the same header name.
pub fn apply_logger_with_header<F>(header: impl Into<String>, factory: F) -> Middleware
where
    F: Fn() -> RequestLogger + Send + Sync + 'static,
{
    let header: Arc<str> = header.into().into();
    let factory = Arc::new(factory);
    middleware_fn(move |inner: Handler| {
        let header = Arc::clone(&header);
        let factory = Arc::clone(&factory);
        handler_fn(move |mut req: Request| {
            let id = request_id_from(&req, &header).unwrap_or_default();
            let logger = factory().with("request_id", id);
            let remote_addr = req
                .extensions()
                .get::<RemoteAddr>()
                .map(|addr| addr.0.clone())
                .unwrap_or_default();

            logger.emit(
                Level::INFO,
                &[
                    ("at", "info".to_string()),
                    ("method", req.method().to_string()),
                    ("path", req.uri().path().to_string()),
                    ("protocol", req.uri().scheme_str().unwrap_or_default().to_string()),
                    ("remote_addr", remote_addr),
                ],
            );

            with_logger(&mut req, logger);
            inner(req)
        })
    })
}
