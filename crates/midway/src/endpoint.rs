//! Typed functions as handlers
//!
//! [`endpoint`] adapts a function to the fixed signature [`EndpointFn`] with
//! [`funconv`], then serves it: the request body is passed in as a `String`
//! held by an [`AnyValue`], and the returned `String` becomes the response
//! body. A function may take the body as `String` or `AnyValue`, and may
//! return a `String` or an `AnyValue` holding one.
//!
//! ```rust,ignore
//! let greet = endpoint(|name: String| -> Result<String, ErrorValue> {
//!     Ok(format!("hello {}", name))
//! })?;
//! ```

use bytes::Bytes;
use funconv::{AdapterResult, AnyValue, ErrorValue, IntoFunction, Wrapped};
use http::StatusCode;
use std::sync::Arc;

use crate::logcontext::get_err_logger;
use crate::middleware::{Handler, Request, Response, handler_fn, text_response};

/// The signature every endpoint function is adapted to
pub type EndpointFn = fn(AnyValue) -> Result<String, ErrorValue>;

/// Adapt `source` to [`EndpointFn`] and serve it as a handler.
///
/// Fails when the signatures cannot be bridged. Failures at call time,
/// including arguments of the wrong dynamic type, produce a
/// `500 Internal Server Error` whose body is the error message.
pub fn endpoint<M>(source: impl IntoFunction<M>) -> AdapterResult<Handler> {
    let wrapped: Arc<Wrapped<EndpointFn>> = Arc::new(funconv::wrap(source)?);
    tracing::debug!(adapter = ?wrapped, "endpoint built");

    Ok(handler_fn(move |req: Request| {
        let wrapped = Arc::clone(&wrapped);
        async move { serve(&wrapped, req) }
    }))
}

fn serve(wrapped: &Wrapped<EndpointFn>, req: Request) -> Response {
    let logger = get_err_logger(&req);
    let body = match String::from_utf8(req.into_body().to_vec()) {
        Ok(body) => body,
        Err(_) => return text_response(StatusCode::BAD_REQUEST, "request body is not UTF-8"),
    };

    match wrapped.try_call((AnyValue::new(body),)) {
        Ok(Ok(output)) => text_response(StatusCode::OK, Bytes::from(output)),
        Ok(Err(err)) => {
            logger.error(format!("endpoint failed: {}", err));
            text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        Err(err) => {
            logger.error(format!("endpoint adapter failed: {}", err));
            text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
