//! Connection management
//!
//! This module handles:
//! * Handle types for each backend (HostARQ FPGA, simulator, Quiggeldy daemon)
//! * Transport abstraction (TCP)
//! * Connection lifecycle and state machine enforcement
//! * Time information and target support queries

mod arq;
mod conn;
mod quiggeldy;
mod sim;
mod state;
mod target;
mod time_info;
mod transport;

pub use arq::ArqConnection;
pub use conn::{
    Backend, Connection, ConnectionConfig, ConnectionConfigBuilder, DEFAULT_ARQ_PORT,
    DEFAULT_CONNECTION_ATTEMPTS_MAX, DEFAULT_CONNECTION_ATTEMPT_WAIT_AFTER,
};
pub use quiggeldy::QuiggeldyClient;
pub use sim::SimConnection;
pub use state::ConnectionState;
pub use target::{Target, TargetRestriction};
pub use time_info::ConnectionTimeInfo;
pub use transport::{unused_port, Endpoint, Transport};
