use log::{error, info, warn};
use reqwest::{Method, StatusCode};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A unique identifier for a particular outgoing request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Log an outgoing request and return the ID assigned to it.
pub fn log_request(method: &Method, path: &str) -> RequestId {
    let id = RequestId::next();
    info!("->req{id} {method} {path}");
    id
}

/// Log the response to a previously logged request.
pub fn log_response(id: RequestId, status: StatusCode, path: &str) {
    let log_msg = format!("<-rsp{id} {status} {path}");
    if status.is_server_error() {
        error!("{log_msg}");
    } else if status.is_client_error() {
        warn!("{log_msg}");
    } else {
        info!("{log_msg}");
    }
}

/// Log a request that never got a response.
pub fn log_transport_failure(id: RequestId, path: &str, err: &reqwest::Error) {
    error!("<-rsp{id} NO RESPONSE {path}: {err}");
}
