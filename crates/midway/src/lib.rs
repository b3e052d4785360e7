#![warn(missing_docs)]
//! # midway
//!
//! Middleware utilities for HTTP handlers built on the [`http`] crate types.
//!
//! ## Features
//!
//! - **Chaining**: compose `Handler -> Handler` middlewares, first listed
//!   outermost
//! - **Request IDs**: assign a random ID header when a request lacks one
//! - **Log context**: per-request loggers with context fields, carried in
//!   request extensions
//! - **Handles**: propagate shared handles (pools, clients) to handlers
//! - **Response cache**: read-through, write-behind caching keyed by path,
//!   honouring `Expires` and `X-Grace-Expires`
//! - **Endpoints**: serve typed functions through the [`funconv`] adapter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use midway::prelude::*;
//!
//! let app = chain([
//!     handle_request_id(RequestIdConfig::default())?,
//!     apply_logger(RequestLogger::default),
//!     cached_handler(Cacher::memory(CacheConfig::default())?),
//! ]);
//!
//! let handler = app(handler_fn(|req: Request| async move {
//!     get_logger(&req).log("rendering page");
//!     text_response(StatusCode::OK, "hello")
//! }));
//! ```

pub mod cache;
pub mod endpoint;
mod error;
pub mod handles;
pub mod logcontext;
pub mod middleware;
pub mod request_id;

#[cfg(test)]
mod tests;

pub use cache::{CacheConfig, CacheError, CacheResult, CacheStore, CachedResponse, Cacher, MemoryStore};
pub use endpoint::{EndpointFn, endpoint};
pub use error::{ConfigError, ConfigResult};
pub use handles::{
    apply_handle, apply_named_handle, get_handle, get_named_handle, with_handle, with_named_handle,
};
pub use logcontext::{
    ComplexLogger, LogRecord, LogSink, RemoteAddr, RequestLogger, TracingSink, apply_logger,
    apply_logger_with_header, get_complex_logger, get_err_logger, get_logger, provide_loggers,
    with_err_logger, with_logger,
};
pub use middleware::{
    Handler, Middleware, Request, Response, chain, handler_fn, middleware_fn, text_response,
};
pub use request_id::{RequestIdConfig, handle_request_id, request_id};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use midway::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::cached_handler;
    pub use crate::{
        CacheConfig, Cacher, Handler, Middleware, Request, RequestIdConfig, RequestLogger,
        Response, apply_logger, chain, get_complex_logger, get_logger, handle_request_id,
        handler_fn, middleware_fn, text_response,
    };
    pub use http::StatusCode;
}
