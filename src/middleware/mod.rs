//! Cross-cutting request concerns applied by [`Router::handle`](crate::Router::handle)
//! around every handler call:
//!
//! - **request id** — an inbound `x-request-id` is honoured, otherwise one is
//!   minted as `<process prefix>-<sequence>`. It is echoed on the response
//!   and recorded on the request span.
//! - **access log** — one `info` event per request with method, path,
//!   status and latency.
//! - **panic recovery** — a panicking handler becomes `500` instead of a
//!   dropped connection; the process keeps serving.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use http::{HeaderMap, HeaderName, Method, StatusCode};
use tracing::{Instrument, Span, error, info};

use crate::handler::BoxFuture;
use crate::response::Response;

/// Header carrying the request id in both directions.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest inbound request id that is trusted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Returns the caller-supplied request id, or mints a new one.
pub(crate) fn request_id(headers: &HeaderMap) -> String {
    let inbound = headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN);

    match inbound {
        Some(id) => id.to_owned(),
        None => {
            let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
            format!("{}-{seq:06}", prefix())
        }
    }
}

fn prefix() -> &'static str {
    static PREFIX: OnceLock<String> = OnceLock::new();
    PREFIX.get_or_init(|| {
        let mut simple = uuid::Uuid::new_v4().simple().to_string();
        simple.truncate(10);
        simple
    })
}

/// Drives a handler future on its own task so a panic inside it is caught
/// and turned into a `500`.
pub(crate) async fn recover(fut: BoxFuture) -> Response {
    match tokio::spawn(fut.instrument(Span::current())).await {
        Ok(response) => response,
        Err(e) => {
            if e.is_panic() {
                error!("handler panicked");
            } else {
                error!("handler task cancelled: {e}");
            }
            Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Emits the access-log line for a finished request.
pub(crate) fn log_access(method: &Method, path: &str, status: StatusCode, started: Instant) {
    info!(
        %method,
        path,
        status = status.as_u16(),
        latency_us = started.elapsed().as_micros() as u64,
        "request completed"
    );
}
