//! Connection construction
//!
//! [`Connector`] is the seam between connection contexts and the code that
//! actually opens connections; [`NetworkConnector`] is the implementation
//! used by default.

mod connector;
mod network;

pub use connector::Connector;
pub use network::NetworkConnector;
