//! Shared test helpers

use crate::logcontext::{LogRecord, LogSink};
use crate::middleware::{Handler, Request, handler_fn, text_response};
use bytes::Bytes;
use http::StatusCode;
use std::sync::{Arc, Mutex};

/// A sink that keeps every record in memory
#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<LogRecord>>>);

impl RecordingSink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.0.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(ToString::to_string).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|r| r.get("message").map(str::to_string))
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, record: &LogRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

pub fn get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// A handler answering 200 with a fixed body
pub fn ok(body: &'static str) -> Handler {
    handler_fn(move |_req: Request| async move { text_response(StatusCode::OK, body) })
}
