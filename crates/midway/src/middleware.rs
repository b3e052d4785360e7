//! Handlers and middleware composition
//!
//! A [`Handler`] turns a request into a response asynchronously. A
//! [`Middleware`] wraps a handler into another handler. [`chain`] folds a
//! list of middlewares into one, first listed outermost.

use bytes::Bytes;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Request type seen by handlers
pub type Request = http::Request<Bytes>;

/// Response type produced by handlers
pub type Response = http::Response<Bytes>;

/// An asynchronous request handler
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// A function from handler to handler
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Build a [`Handler`] from an async function or closure.
///
/// # Example
///
/// ```rust,ignore
/// let hello = handler_fn(|_req: Request| async { text_response(StatusCode::OK, "hello") });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Build a [`Middleware`] from a closure over the inner handler.
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compose middlewares into one.
///
/// The first middleware listed is the outermost: it sees the request first
/// and the response last. An empty chain returns the inner handler as is.
pub fn chain(mwares: impl IntoIterator<Item = Middleware>) -> Middleware {
    let mwares: Arc<[Middleware]> = mwares.into_iter().collect();
    tracing::trace!(count = mwares.len(), "built middleware chain");
    Arc::new(move |inner: Handler| mwares.iter().rev().fold(inner, |next, mw| mw(next)))
}

/// Build a response with a status and a plain-text body.
pub fn text_response(status: http::StatusCode, body: impl Into<Bytes>) -> Response {
    let mut response = http::Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
