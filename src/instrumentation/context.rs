//! W3C Trace Context propagation.
//!
//! The relay stamps its outbound call with a `traceparent` header so the
//! responder's span joins the same trace. Only version `00` is understood.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Header carrying the trace context between hops.
pub const TRACEPARENT: &str = "traceparent";

/// Errors from parsing a `traceparent` header value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceParentError {
    #[error("traceparent must have 4 dash-separated fields")]
    FieldCount,
    #[error("unsupported traceparent version '{0}'")]
    Version(String),
    #[error("malformed {0} field")]
    Malformed(&'static str),
    #[error("all-zero {0} is invalid")]
    Zero(&'static str),
}

/// Parsed `traceparent` header: `00-<trace-id>-<parent-id>-<flags>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceParent {
    pub trace_id: u128,
    pub parent_id: u64,
    pub sampled: bool,
}

impl FromStr for TraceParent {
    type Err = TraceParentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(TraceParentError::FieldCount);
        }
        if parts[0] != "00" {
            return Err(TraceParentError::Version(parts[0].to_string()));
        }

        let trace_id = parse_hex_u128(parts[1]).ok_or(TraceParentError::Malformed("trace-id"))?;
        let parent_id = parse_hex_u64(parts[2]).ok_or(TraceParentError::Malformed("parent-id"))?;
        let flags = parse_hex_u8(parts[3]).ok_or(TraceParentError::Malformed("trace-flags"))?;

        if trace_id == 0 {
            return Err(TraceParentError::Zero("trace-id"));
        }
        if parent_id == 0 {
            return Err(TraceParentError::Zero("parent-id"));
        }

        Ok(Self {
            trace_id,
            parent_id,
            sampled: flags & 0x01 == 0x01,
        })
    }
}

impl fmt::Display for TraceParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "00-{:032x}-{:016x}-{:02x}",
            self.trace_id,
            self.parent_id,
            u8::from(self.sampled)
        )
    }
}

fn parse_hex_u128(s: &str) -> Option<u128> {
    if s.len() != 32 || !is_lower_hex(s) {
        return None;
    }
    u128::from_str_radix(s, 16).ok()
}

fn parse_hex_u64(s: &str) -> Option<u64> {
    if s.len() != 16 || !is_lower_hex(s) {
        return None;
    }
    u64::from_str_radix(s, 16).ok()
}

fn parse_hex_u8(s: &str) -> Option<u8> {
    if s.len() != 2 || !is_lower_hex(s) {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Identity of one span within a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: u128,
    pub span_id: u64,
    pub parent_span_id: Option<u64>,
    pub sampled: bool,
}

impl SpanContext {
    /// Start a fresh trace.
    pub fn root() -> Self {
        Self {
            trace_id: Uuid::new_v4().as_u128(),
            span_id: new_span_id(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Continue the trace described by an inbound header, keeping its
    /// sampling decision.
    pub fn child_of(parent: &TraceParent) -> Self {
        Self {
            trace_id: parent.trace_id,
            span_id: new_span_id(),
            parent_span_id: Some(parent.parent_id),
            sampled: parent.sampled,
        }
    }

    /// Continue an inbound trace when one was supplied.
    pub fn from_parent(parent: Option<&TraceParent>) -> Self {
        parent.map_or_else(Self::root, Self::child_of)
    }

    /// Header value that makes this span the parent of the next hop.
    pub fn traceparent(&self) -> TraceParent {
        TraceParent {
            trace_id: self.trace_id,
            parent_id: self.span_id,
            sampled: self.sampled,
        }
    }

    pub fn trace_id_hex(&self) -> String {
        format!("{:032x}", self.trace_id)
    }

    pub fn span_id_hex(&self) -> String {
        format!("{:016x}", self.span_id)
    }

    pub fn parent_span_id_hex(&self) -> Option<String> {
        self.parent_span_id.map(|id| format!("{:016x}", id))
    }
}

fn new_span_id() -> u64 {
    // Low half of a v4 UUID always carries the variant bits, so it is never zero.
    Uuid::new_v4().as_u128() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_parse_w3c_example() {
        let tp: TraceParent = SAMPLE.parse().unwrap();
        assert_eq!(tp.trace_id, 0x4bf92f3577b34da6a3ce929d0e0e4736);
        assert_eq!(tp.parent_id, 0x00f067aa0ba902b7);
        assert!(tp.sampled);
        assert_eq!(tp.to_string(), SAMPLE);
    }

    #[test]
    fn test_rejects_malformed_headers() {
        assert_eq!("garbage".parse::<TraceParent>(), Err(TraceParentError::FieldCount));
        assert_eq!(
            "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".parse::<TraceParent>(),
            Err(TraceParentError::Version("01".into()))
        );
        assert_eq!(
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01".parse::<TraceParent>(),
            Err(TraceParentError::Malformed("trace-id"))
        );
        assert_eq!(
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01".parse::<TraceParent>(),
            Err(TraceParentError::Zero("trace-id"))
        );
    }

    #[test]
    fn test_child_context_keeps_trace() {
        let parent: TraceParent = SAMPLE.parse().unwrap();
        let child = SpanContext::child_of(&parent);
        assert_eq!(child.trace_id, parent.trace_id);
        assert_eq!(child.parent_span_id, Some(parent.parent_id));
        assert_ne!(child.span_id, parent.parent_id);
        assert_eq!(child.traceparent().parent_id, child.span_id);
    }

    #[test]
    fn test_child_context_keeps_sampling_decision() {
        let unsampled: TraceParent = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00"
            .parse()
            .unwrap();
        let child = SpanContext::child_of(&unsampled);
        assert!(!child.sampled);
        assert!(child.traceparent().to_string().ends_with("-00"));

        let sampled = SpanContext::child_of(&SAMPLE.parse().unwrap());
        assert!(sampled.traceparent().to_string().ends_with("-01"));
        assert!(SpanContext::root().sampled);
    }

    #[test]
    fn test_root_context_ids_are_nonzero() {
        for _ in 0..32 {
            let ctx = SpanContext::root();
            assert_ne!(ctx.trace_id, 0);
            assert_ne!(ctx.span_id, 0);
            assert!(ctx.parent_span_id.is_none());
            let header = ctx.traceparent().to_string();
            assert_eq!(header.parse::<TraceParent>().unwrap(), ctx.traceparent());
        }
    }
}
