//! Failure classification for failed requests.
//!
//! The one question answered here is whether the remote produced an
//! interpretable response. If it did not (DNS, refused, reset, timeout,
//! socket closed before a reply), the failure is a connectivity failure and
//! the mutation may be deferred. If it did, even with a 5xx status, the
//! failure belongs to the caller and is never queued.

mod error;

pub use error::RequestError;

use std::io;

/// High-level classification of a request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No interpretable response was obtained.
    Connectivity,
    /// The remote responded with this non-success status.
    Rejected(u32),
    /// Local or protocol failure that a later replay would not fix.
    Other,
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return FailureKind::Connectivity;
    }
    FailureKind::Other
}

/// Classify a socket-level IO error.
pub fn classify_io_error(e: &io::Error) -> FailureKind {
    match e.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::TimedOut
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::AddrNotAvailable => FailureKind::Connectivity,
        _ => FailureKind::Other,
    }
}

/// Classify a request error into a [`FailureKind`].
pub fn classify(e: &RequestError) -> FailureKind {
    match e {
        RequestError::Curl(ce) => classify_curl_error(ce),
        RequestError::Io(ie) => classify_io_error(ie),
        RequestError::Status(code) => FailureKind::Rejected(*code),
        RequestError::Other(_) => FailureKind::Other,
    }
}

/// True when no response was obtained at all.
pub fn is_connectivity_failure(e: &RequestError) -> bool {
    classify(e) == FailureKind::Connectivity
}
