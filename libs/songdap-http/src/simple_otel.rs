//! Minimal W3C trace context propagation for outgoing calls.
//!
//! Each outgoing request gets a fresh `traceparent` so backend logs can be
//! correlated with the client's `outgoing_http` span.

use http::{HeaderMap, HeaderName, HeaderValue};

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

/// Generate a sampled `traceparent` value: `00-<trace-id>-<span-id>-01`.
pub fn new_traceparent() -> String {
    let trace_id = rand::random::<u128>();
    let span_id = rand::random::<u64>();
    format!("00-{trace_id:032x}-{span_id:016x}-01")
}

/// Insert `traceparent` into `headers`, returning the trace id that was used.
pub fn inject_trace_context(headers: &mut HeaderMap) -> Option<String> {
    let traceparent = new_traceparent();
    let value = HeaderValue::from_str(&traceparent).ok()?;
    headers.insert(HeaderName::from_static(TRACEPARENT), value);
    parse_trace_id(&traceparent)
}

/// Parse trace ID from traceparent header
pub fn parse_trace_id(traceparent: &str) -> Option<String> {
    let parts: Vec<&str> = traceparent.split('-').collect();
    if parts.len() == 4 && parts[0] == "00" && parts[1].len() == 32 {
        Some(parts[1].to_string())
    } else {
        None
    }
}
