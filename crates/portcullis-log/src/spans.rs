//! Request tracing spans.

use tracing::{info_span, Span};

/// Span covering one request's pass through the authentication gate.
pub fn gate_span(method: &str, path: &str) -> Span {
    info_span!("gate", method = %method, path = %path, decision = tracing::field::Empty)
}

/// Record the gate's decision on the current span.
pub fn record_decision(decision: &dyn std::fmt::Debug) {
    Span::current().record("decision", tracing::field::debug(decision));
}
