//! Request execution capability and the audit-log decorator
//!
//! The request helper only needs "something that executes a request". The
//! production stack is a [`reqwest::Client`] wrapped in [`AuditLog`], which
//! prints every outgoing request before delegating; tests can wrap a plain
//! client or write the audit trail to a buffer.

use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Executes fully built HTTP requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response headers with a streamable body
    async fn execute(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        reqwest::Client::execute(self, request).await
    }
}

/// Decorator printing `"<METHOD> <URL>"` for every request before it is sent
pub struct AuditLog<T> {
    inner: T,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl<T> AuditLog<T> {
    /// Wrap a transport, writing the audit trail to `sink`
    pub fn new(inner: T, sink: Box<dyn Write + Send>) -> Self {
        Self {
            inner,
            sink: Mutex::new(sink),
        }
    }

    /// Wrap a transport, writing the audit trail to standard output
    pub fn stdout(inner: T) -> Self {
        Self::new(inner, Box::new(std::io::stdout()))
    }

    fn record(&self, request: &reqwest::Request) {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let written = writeln!(sink, "{} {}", request.method(), request.url())
            .and_then(|()| sink.flush());
        if let Err(e) = written {
            warn!(error = %e, "failed to write audit log line");
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for AuditLog<T> {
    async fn execute(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        self.record(&request);
        debug!(method = %request.method(), url = %request.url(), "sending request");
        self.inner.execute(request).await
    }
}
