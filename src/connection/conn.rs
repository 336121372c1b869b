//! Core connection types

use super::arq::ArqConnection;
use super::quiggeldy::QuiggeldyClient;
use super::sim::SimConnection;
use super::state::ConnectionState;
use super::target::{Target, TargetRestriction};
use super::time_info::ConnectionTimeInfo;
use super::transport::{Endpoint, Transport};
use crate::metrics::{counters, histograms};
use crate::Result;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Port the FPGA listens on when none is configured
pub const DEFAULT_ARQ_PORT: u16 = 1234;

/// Default number of attempts when connecting to a daemon
pub const DEFAULT_CONNECTION_ATTEMPTS_MAX: usize = 10;

/// Default wait between two daemon connection attempts
pub const DEFAULT_CONNECTION_ATTEMPT_WAIT_AFTER: Duration = Duration::from_millis(1000);

/// Connection configuration
///
/// Parameters that do not come from the environment. Use
/// `ConnectionConfig::builder()` to override individual values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// TCP connection timeout (default: none)
    pub connect_timeout: Option<Duration>,
    /// Port of the FPGA endpoint for HostARQ connections
    pub arq_port: u16,
    /// Maximum number of attempts when connecting to a Quiggeldy daemon
    pub connection_attempts_max: usize,
    /// Wait after each failed Quiggeldy connection attempt
    pub connection_attempt_wait_after: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            arq_port: DEFAULT_ARQ_PORT,
            connection_attempts_max: DEFAULT_CONNECTION_ATTEMPTS_MAX,
            connection_attempt_wait_after: DEFAULT_CONNECTION_ATTEMPT_WAIT_AFTER,
        }
    }
}

impl ConnectionConfig {
    /// Create a builder starting from the defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use hxcomm_context::ConnectionConfig;
    /// use std::time::Duration;
    ///
    /// let config = ConnectionConfig::builder()
    ///     .connect_timeout(Duration::from_secs(5))
    ///     .connection_attempts_max(3)
    ///     .build();
    /// assert_eq!(config.connection_attempts_max, 3);
    /// ```
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            config: ConnectionConfig::default(),
        }
    }
}

/// Builder for `ConnectionConfig`
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set TCP connection timeout
    ///
    /// Default: None (no timeout)
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.config.connect_timeout = Some(duration);
        self
    }

    /// Set the FPGA port used for HostARQ connections
    pub fn arq_port(mut self, port: u16) -> Self {
        self.config.arq_port = port;
        self
    }

    /// Set the maximum number of Quiggeldy connection attempts
    ///
    /// Zero is treated as one attempt.
    pub fn connection_attempts_max(mut self, attempts: usize) -> Self {
        self.config.connection_attempts_max = attempts;
        self
    }

    /// Set the wait after each failed Quiggeldy connection attempt
    pub fn connection_attempt_wait_after(mut self, wait: Duration) -> Self {
        self.config.connection_attempt_wait_after = wait;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

/// A kind of connection to a backend.
///
/// Handle types are never default-constructible: every value stands for one
/// open connection.
pub trait Backend {
    /// Name of the connection type
    const NAME: &'static str;

    /// Targets this connection type can execute on
    const SUPPORTED_TARGETS: &'static [Target];

    /// Whether this connection type can serve objects with `restriction`
    fn supports(restriction: TargetRestriction) -> bool {
        Self::SUPPORTED_TARGETS
            .iter()
            .any(|target| target.satisfies(restriction))
    }

    /// Accumulated time information
    fn time_info(&self) -> ConnectionTimeInfo;
}

/// Open transport plus bookkeeping shared by all handle types
#[derive(Debug)]
pub(crate) struct Link {
    transport: Option<Transport>,
    peer: Endpoint,
    state: ConnectionState,
    time_info: ConnectionTimeInfo,
    kind: &'static str,
}

impl Link {
    /// Open a transport to `endpoint`
    pub(crate) async fn open(
        kind: &'static str,
        endpoint: &Endpoint,
        config: &ConnectionConfig,
    ) -> Result<Self> {
        let mut state = ConnectionState::Initial;
        state.transition(ConnectionState::Connecting)?;

        counters::connect_attempt(kind);
        let started = Instant::now();
        let transport = Transport::connect_tcp(endpoint, config.connect_timeout)
            .instrument(tracing::debug_span!("connect", kind, endpoint = %endpoint))
            .await
            .map_err(|e| {
                counters::connection_error(kind, e.category());
                tracing::debug!(kind, endpoint = %endpoint, error = %e, "connect failed");
                e
            })?;
        histograms::connect_duration(kind, started.elapsed().as_millis() as u64);

        state.transition(ConnectionState::Open)?;
        counters::connection_opened(kind);
        tracing::info!(kind, endpoint = %endpoint, "connection established");

        Ok(Self {
            transport: Some(transport),
            peer: endpoint.clone(),
            state,
            time_info: ConnectionTimeInfo::default(),
            kind,
        })
    }

    pub(crate) fn peer(&self) -> &Endpoint {
        &self.peer
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn time_info(&self) -> ConnectionTimeInfo {
        self.time_info
    }

    pub(crate) fn record_time_info(&mut self, delta: ConnectionTimeInfo) {
        self.time_info += delta;
    }

    /// Send raw bytes, accounting the time as commit duration
    pub(crate) async fn commit(&mut self, payload: &[u8]) -> Result<()> {
        if !self.state.is_open() {
            return Err(crate::Error::InvalidState {
                expected: ConnectionState::Open.to_string(),
                actual: self.state.to_string(),
            });
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or(crate::Error::ConnectionClosed)?;

        let started = Instant::now();
        let written = match transport.write_all(payload).await {
            Ok(()) => transport.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.abort(&e);
            return Err(e);
        }
        self.time_info.commit_duration += started.elapsed();
        Ok(())
    }

    /// Drop a transport that failed; the link is unusable afterwards
    fn abort(&mut self, error: &crate::Error) {
        self.transport = None;
        self.state = ConnectionState::Closed;
        counters::connection_error(self.kind, error.category());
        counters::connection_closed(self.kind);
        tracing::warn!(
            kind = self.kind,
            endpoint = %self.peer,
            error = %error,
            "transport failed, connection closed"
        );
    }

    /// Shut the transport down gracefully.
    ///
    /// Closing a link that is already closed is an `InvalidState` error.
    pub(crate) async fn close(&mut self) -> Result<()> {
        self.state.transition(ConnectionState::Closing)?;
        let result = match self.transport.take() {
            Some(mut transport) => transport.shutdown().await,
            None => Ok(()),
        };
        self.state.transition(ConnectionState::Closed)?;
        counters::connection_closed(self.kind);
        tracing::debug!(kind = self.kind, endpoint = %self.peer, "connection closed");
        result
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if self.state != ConnectionState::Closed {
            counters::connection_closed(self.kind);
            tracing::debug!(kind = self.kind, endpoint = %self.peer, "connection released");
        }
    }
}

/// Inherent accessors every handle type shares through its `link` field.
macro_rules! link_handle {
    ($ty:ty, $name:literal, [$($target:expr),* $(,)?]) => {
        impl $ty {
            /// Endpoint of the backend
            pub fn peer(&self) -> &$crate::connection::Endpoint {
                self.link.peer()
            }

            /// Current connection state
            pub fn state(&self) -> $crate::connection::ConnectionState {
                self.link.state()
            }

            /// Accumulated time information
            pub fn time_info(&self) -> $crate::connection::ConnectionTimeInfo {
                self.link.time_info()
            }

            /// Add externally measured durations to the time information
            pub fn record_time_info(&mut self, delta: $crate::connection::ConnectionTimeInfo) {
                self.link.record_time_info(delta)
            }

            /// Send raw bytes to the backend
            pub async fn commit(&mut self, payload: &[u8]) -> $crate::Result<()> {
                self.link.commit(payload).await
            }

            /// Close the connection gracefully.
            ///
            /// The handle stays around reporting `Closed`; further commits fail.
            pub async fn close(&mut self) -> $crate::Result<()> {
                self.link.close().await
            }
        }

        impl $crate::connection::Backend for $ty {
            const NAME: &'static str = $name;
            const SUPPORTED_TARGETS: &'static [$crate::connection::Target] = &[$($target),*];

            fn time_info(&self) -> $crate::connection::ConnectionTimeInfo {
                self.link.time_info()
            }
        }
    };
}

pub(crate) use link_handle;

/// Connection to any backend
///
/// Returned when the environment decides which backend to use.
#[derive(Debug)]
pub enum Connection {
    /// FPGA via HostARQ
    Arq(ArqConnection),
    /// Simulator
    Sim(SimConnection),
    /// Quiggeldy daemon
    Quiggeldy(QuiggeldyClient),
}

impl Connection {
    fn link(&self) -> &Link {
        match self {
            Connection::Arq(c) => &c.link,
            Connection::Sim(c) => &c.link,
            Connection::Quiggeldy(c) => &c.link,
        }
    }

    fn link_mut(&mut self) -> &mut Link {
        match self {
            Connection::Arq(c) => &mut c.link,
            Connection::Sim(c) => &mut c.link,
            Connection::Quiggeldy(c) => &mut c.link,
        }
    }

    /// Name of the underlying connection type
    pub fn name(&self) -> &'static str {
        match self {
            Connection::Arq(_) => <ArqConnection as Backend>::NAME,
            Connection::Sim(_) => <SimConnection as Backend>::NAME,
            Connection::Quiggeldy(_) => <QuiggeldyClient as Backend>::NAME,
        }
    }

    /// Targets the underlying connection type can execute on
    pub fn supported_targets(&self) -> &'static [Target] {
        match self {
            Connection::Arq(_) => <ArqConnection as Backend>::SUPPORTED_TARGETS,
            Connection::Sim(_) => <SimConnection as Backend>::SUPPORTED_TARGETS,
            Connection::Quiggeldy(_) => <QuiggeldyClient as Backend>::SUPPORTED_TARGETS,
        }
    }

    /// Whether the underlying connection type supports `restriction`
    pub fn supports(&self, restriction: TargetRestriction) -> bool {
        match self {
            Connection::Arq(_) => ArqConnection::supports(restriction),
            Connection::Sim(_) => SimConnection::supports(restriction),
            Connection::Quiggeldy(_) => QuiggeldyClient::supports(restriction),
        }
    }

    /// Endpoint of the backend
    pub fn peer(&self) -> &Endpoint {
        self.link().peer()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.link().state()
    }

    /// Accumulated time information
    pub fn time_info(&self) -> ConnectionTimeInfo {
        self.link().time_info()
    }

    /// Add externally measured durations to the time information
    pub fn record_time_info(&mut self, delta: ConnectionTimeInfo) {
        self.link_mut().record_time_info(delta)
    }

    /// Send raw bytes to the backend
    pub async fn commit(&mut self, payload: &[u8]) -> Result<()> {
        self.link_mut().commit(payload).await
    }

    /// Close the connection gracefully
    pub async fn close(&mut self) -> Result<()> {
        self.link_mut().close().await
    }
}

impl From<ArqConnection> for Connection {
    fn from(connection: ArqConnection) -> Self {
        Connection::Arq(connection)
    }
}

impl From<SimConnection> for Connection {
    fn from(connection: SimConnection) -> Self {
        Connection::Sim(connection)
    }
}

impl From<QuiggeldyClient> for Connection {
    fn from(connection: QuiggeldyClient) -> Self {
        Connection::Quiggeldy(connection)
    }
}
