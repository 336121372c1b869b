//! Histogram metrics

use super::labels;

/// Time from starting to connect until the transport was open, in milliseconds
pub(crate) fn connect_duration(kind: &'static str, duration_ms: u64) {
    metrics::histogram!("hxcomm_connect_duration_ms", labels::KIND => kind)
        .record(duration_ms as f64);
}
