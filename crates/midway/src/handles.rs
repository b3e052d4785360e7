//! Shared handles carried in request extensions
//!
//! Any cloneable, thread-safe value (a database pool, a client, a config
//! snapshot) can ride along with a request. Unnamed handles are keyed by type;
//! named handles by a string, so several handles of one type can coexist.

use crate::middleware::{Handler, Middleware, Request, handler_fn, middleware_fn};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
struct Handle<T>(T);

#[derive(Clone, Default)]
struct NamedHandles(HashMap<String, Arc<dyn Any + Send + Sync>>);

/// Store an unnamed handle of type `T`, replacing any previous one
pub fn with_handle<B, T>(req: &mut http::Request<B>, handle: T)
where
    T: Clone + Send + Sync + 'static,
{
    req.extensions_mut().insert(Handle(handle));
}

/// The unnamed handle of type `T`, if any
pub fn get_handle<B, T>(req: &http::Request<B>) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    req.extensions().get::<Handle<T>>().map(|h| h.0.clone())
}

/// Store a handle under `name`, replacing any previous handle of that name
pub fn with_named_handle<B, T>(req: &mut http::Request<B>, name: impl Into<String>, handle: T)
where
    T: Clone + Send + Sync + 'static,
{
    let extensions = req.extensions_mut();
    let mut named = extensions.remove::<NamedHandles>().unwrap_or_default();
    named.0.insert(name.into(), Arc::new(handle));
    extensions.insert(named);
}

/// The handle stored under `name`, if any and of type `T`
pub fn get_named_handle<B, T>(req: &http::Request<B>, name: &str) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    req.extensions()
        .get::<NamedHandles>()?
        .0
        .get(name)?
        .downcast_ref::<T>()
        .cloned()
}

/// Middleware that stores `handle` on every request
pub fn apply_handle<T>(handle: T) -> Middleware
where
    T: Clone + Send + Sync + 'static,
{
    middleware_fn(move |inner: Handler| {
        let handle = handle.clone();
        handler_fn(move |mut req: Request| {
            with_handle(&mut req, handle.clone());
            inner(req)
        })
    })
}

/// Middleware that stores `handle` under `name` on every request
pub fn apply_named_handle<T>(handle: T, name: impl Into<String>) -> Middleware
where
    T: Clone + Send + Sync + 'static,
{
    let name: Arc<str> = Arc::from(name.into());
    middleware_fn(move |inner: Handler| {
        let handle = handle.clone();
        let name = Arc::clone(&name);
        handler_fn(move |mut req: Request| {
            with_named_handle(&mut req, name.as_ref(), handle.clone());
            inner(req)
        })
    })
}
