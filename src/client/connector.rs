//! Connection construction boundary

use crate::Result;
use std::future::Future;

/// Creates connection handles.
///
/// Mirrors the constructors of the connection layer: an environment-driven
/// selector plus zero- and explicit-argument constructors for hardware and
/// simulator connections. [`ConnectionContext`](crate::ConnectionContext)
/// only ever talks to this trait, so any implementation can back a context.
pub trait Connector {
    /// Handle type produced by this connector
    type Connection: Send;

    /// Let the environment decide which backend to connect to
    fn connect_from_env(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Connect to the FPGA named by the environment
    fn connect_arq(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Connect to the FPGA at `ip_address`
    fn connect_arq_to(
        &self,
        ip_address: &str,
    ) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Connect to the simulator named by the environment
    fn connect_sim(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Connect to the simulator at an explicit address.
    ///
    /// Both values are forwarded as given, even if one of them is unset.
    fn connect_sim_to(
        &self,
        ip_address: Option<&str>,
        port: Option<u16>,
    ) -> impl Future<Output = Result<Self::Connection>> + Send;
}
