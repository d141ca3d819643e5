//! Per-invocation context delivered by the runtime.

use crate::storage::StorageKey;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::Span;

/// Metadata the platform attaches to one invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// AWS request ID of this invocation.
    pub request_id: String,
    /// Deadline as milliseconds since the Unix epoch (0 when unknown).
    pub deadline_ms: u64,
    /// ARN of the function being invoked.
    pub invoked_function_arn: String,
    /// X-Ray trace header, if tracing is active.
    pub trace_id: Option<String>,
    /// Span covering the invocation.
    pub span: Span,
}

impl InvocationContext {
    /// Create a context for the given request ID.
    pub fn new(request_id: impl Into<String>) -> Self {
        let request_id = request_id.into();
        let span = tracing::info_span!(
            "invocation",
            request_id = %request_id,
            trace_id = tracing::field::Empty
        );
        Self {
            request_id,
            deadline_ms: 0,
            invoked_function_arn: String::new(),
            trace_id: None,
            span,
        }
    }

    /// Set the deadline.
    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = deadline_ms;
        self
    }

    /// Set the invoked function ARN.
    pub fn with_function_arn(mut self, arn: impl Into<String>) -> Self {
        self.invoked_function_arn = arn.into();
        self
    }

    /// Set the trace header and record it on the span.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        let trace_id = trace_id.into();
        self.span.record("trace_id", trace_id.as_str());
        self.trace_id = Some(trace_id);
        self
    }

    /// Deadline as a point in time, if the platform supplied one.
    pub fn deadline(&self) -> Option<SystemTime> {
        (self.deadline_ms > 0).then(|| UNIX_EPOCH + Duration::from_millis(self.deadline_ms))
    }

    /// Time left before the platform times out the invocation.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.duration_since(SystemTime::now()).unwrap_or_default())
    }
}

impl StorageKey for InvocationContext {
    type Value = InvocationContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = InvocationContext::new("req-1")
            .with_function_arn("arn:aws:lambda:eu-west-1:123:function:todos")
            .with_trace_id("Root=1-abc");

        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.trace_id.as_deref(), Some("Root=1-abc"));
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_expired_deadline_has_no_time_left() {
        let ctx = InvocationContext::new("req-2").with_deadline_ms(1);
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
