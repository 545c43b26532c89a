//! Utility functions for tracing

/// Create a span for agent operations
///
/// Declares `turn.duration_ms` and the error fields so [`record_duration`]
/// and [`record_error`] can fill them in later.
///
/// # Example
///
/// ```rust
/// use research_observability::agent_span;
///
/// let span = agent_span!("session_20260105_142233", "turn");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! agent_span {
    ($session_id:expr, $operation:expr) => {
        tracing::info_span!(
            "agent.operation",
            session.id = $session_id,
            operation = $operation,
            turn.duration_ms = tracing::field::Empty,
            error = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    };
}

/// Create a span around one observed tool event
///
/// The `agent` field starts empty and is recorded once attribution is known.
///
/// # Example
///
/// ```rust
/// use research_observability::tool_span;
///
/// let span = tool_span!("WebSearch", "pre");
/// span.record("agent", "researcher");
/// ```
#[macro_export]
macro_rules! tool_span {
    ($tool:expr, $phase:expr) => {
        tracing::debug_span!(
            "tool.event",
            tool.name = $tool,
            tool.phase = $phase,
            agent = tracing::field::Empty,
        )
    };
}

/// Record an error on the current span and emit it as an error event
///
/// # Example
///
/// ```rust
/// use research_observability::record_error;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// record_error(&err);
/// ```
pub fn record_error<E: std::error::Error>(error: &E) {
    let span = tracing::Span::current();
    span.record("error", true);
    span.record("error.message", error.to_string());
    tracing::error!(error = %error, "Operation failed");
}

/// Record latency/duration on the current span
///
/// # Example
///
/// ```rust
/// use research_observability::record_duration;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// record_duration("turn.duration_ms", start.elapsed());
/// ```
pub fn record_duration(key: &str, duration: std::time::Duration) {
    let span = tracing::Span::current();
    span.record(key, duration.as_millis() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing::field::{Field, Visit};
    use tracing::span::{Id, Record};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(String, String)>>>);

    impl Visit for Recorded {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.lock().unwrap().push((field.name().to_string(), format!("{value:?}")));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Recorded {
        fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
            values.record(&mut self.clone());
        }
    }

    #[test]
    fn test_duration_and_error_land_on_agent_span() {
        let recorded = Recorded::default();
        let subscriber = tracing_subscriber::registry().with(recorded.clone());
        tracing::subscriber::with_default(subscriber, || {
            let span = crate::agent_span!("session_20260105_142233", "turn");
            span.in_scope(|| {
                record_duration("turn.duration_ms", Duration::from_millis(1500));
                record_error(&std::io::Error::other("disk full"));
            });
        });

        let fields = recorded.0.lock().unwrap().clone();
        assert!(fields.contains(&("turn.duration_ms".to_string(), "1500".to_string())), "{fields:?}");
        assert!(fields.contains(&("error".to_string(), "true".to_string())), "{fields:?}");
    }

    #[test]
    fn test_record_outside_span_is_harmless() {
        record_duration("turn.duration_ms", Duration::from_millis(5));
    }
}
