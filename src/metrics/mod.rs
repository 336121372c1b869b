//! Connection lifecycle metrics
//!
//! Thin wrappers over the `metrics` facade. Nothing is recorded unless the
//! application installs a recorder.

pub(crate) mod counters;
pub(crate) mod histograms;
pub(crate) mod labels;
