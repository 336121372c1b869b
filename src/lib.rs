//! Scoped connection management for neuromorphic hardware.
//!
//! A [`ConnectionContext`] acquires exactly one connection handle from a
//! pluggable [`Strategy`] on entry and releases it on every exit path:
//!
//! * [`Strategy::Auto`] lets the environment decide (Quiggeldy daemon,
//!   HostARQ-attached FPGA or simulator)
//! * [`Strategy::Arq`] talks to an FPGA directly
//! * [`Strategy::Sim`] talks to a simulator
//!
//! ```no_run
//! # async fn example() -> hxcomm_context::Result<()> {
//! use hxcomm_context::{ConnectionContext, ConnectionTimeInfo};
//!
//! let mut context = ConnectionContext::sim(Some("127.0.0.1".into()), Some(50051));
//! let connection = context.scope().await?;
//! assert_eq!(connection.time_info(), ConnectionTimeInfo::default());
//! # Ok(())
//! # }
//! ```
//!
//! Connections are created through the [`Connector`] trait. [`NetworkConnector`]
//! resolves endpoints from the environment and opens TCP transports; other
//! implementations can be plugged in with [`ConnectionContext::with_connector`].

#![warn(missing_docs)]

pub mod client;
pub mod connection;
pub mod context;
pub mod env;
pub mod error;
pub(crate) mod metrics;

pub use client::{Connector, NetworkConnector};
pub use connection::{
    ArqConnection, Backend, Connection, ConnectionConfig, ConnectionTimeInfo, QuiggeldyClient,
    SimConnection, Target, TargetRestriction,
};
pub use context::{ConnectionContext, ManagedConnection, Strategy};
pub use env::Environment;
pub use error::{Error, Result};
