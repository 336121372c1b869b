//! Label keys and values

pub(crate) const KIND: &str = "kind";
pub(crate) const REASON: &str = "reason";
pub(crate) const STRATEGY: &str = "strategy";

pub(crate) const KIND_ARQ: &str = "arq";
pub(crate) const KIND_SIM: &str = "sim";
pub(crate) const KIND_QUIGGELDY: &str = "quiggeldy";
