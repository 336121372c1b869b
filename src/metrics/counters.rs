//! Counter metrics

use super::labels;

/// A connection of the given kind was established
pub(crate) fn connection_opened(kind: &'static str) {
    metrics::counter!("hxcomm_connections_opened_total", labels::KIND => kind).increment(1);
}

/// A connection of the given kind was released
pub(crate) fn connection_closed(kind: &'static str) {
    metrics::counter!("hxcomm_connections_closed_total", labels::KIND => kind).increment(1);
}

/// Establishing a connection failed
pub(crate) fn connection_error(kind: &'static str, reason: &'static str) {
    metrics::counter!(
        "hxcomm_connection_errors_total",
        labels::KIND => kind,
        labels::REASON => reason
    )
    .increment(1);
}

/// A single transport connect attempt was made
pub(crate) fn connect_attempt(kind: &'static str) {
    metrics::counter!("hxcomm_connect_attempts_total", labels::KIND => kind).increment(1);
}

/// A connection context acquired its handle
pub(crate) fn context_entered(strategy: &'static str) {
    metrics::counter!("hxcomm_contexts_entered_total", labels::STRATEGY => strategy).increment(1);
}

/// A connection context released its handle
pub(crate) fn context_exited(strategy: &'static str) {
    metrics::counter!("hxcomm_contexts_exited_total", labels::STRATEGY => strategy).increment(1);
}
