//! Maps HTTP/reqwest failures to the core's [`AdapterError`] currency.
//!
//! The core only ever distinguishes cancellation from everything else, so
//! status codes collapse to a single descriptive string rather than a
//! richer error taxonomy with no consumer.

use agent_types::AdapterError;

/// Map an HTTP status code from the Anthropic API to an [`AdapterError`].
///
/// Reference: <https://docs.anthropic.com/en/api/errors>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> AdapterError {
    let reason = match status.as_u16() {
        401 => "authentication failed",
        400 => "invalid request",
        404 => "model not found",
        429 => "rate limited",
        529 => "overloaded",
        500..=528 | 530..=599 => "service unavailable",
        _ => "request failed",
    };
    AdapterError::new(format!("{reason} (HTTP {status}): {body}"))
}

/// Map a [`reqwest::Error`] to an [`AdapterError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::new(format!("request timed out: {err}"))
    } else {
        AdapterError::new(format!("network error: {err}"))
    }
}
