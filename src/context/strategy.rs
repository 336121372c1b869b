//! How a context obtains its connection

use crate::client::Connector;
use crate::Result;
use std::fmt;

/// Connection strategy of a [`ConnectionContext`](super::ConnectionContext)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Backend picked from the environment
    #[default]
    Auto,

    /// Direct FPGA connection over HostARQ
    Arq {
        /// FPGA address; taken from the environment when unset
        ip_address: Option<String>,
    },

    /// Simulator connection
    Sim {
        /// Simulator host
        ip_address: Option<String>,
        /// Simulator port
        port: Option<u16>,
    },
}

impl Strategy {
    /// Short name used as metrics label
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Arq { .. } => "arq",
            Strategy::Sim { .. } => "sim",
        }
    }

    /// Create a connection through `connector`.
    ///
    /// Exactly one connector call is made. A simulator address is only taken
    /// from the environment if neither host nor port is given; otherwise both
    /// values are passed on as they are.
    pub async fn connect<C: Connector>(&self, connector: &C) -> Result<C::Connection> {
        match self {
            Strategy::Auto => connector.connect_from_env().await,
            Strategy::Arq { ip_address: None } => connector.connect_arq().await,
            Strategy::Arq {
                ip_address: Some(ip_address),
            } => connector.connect_arq_to(ip_address).await,
            Strategy::Sim {
                ip_address: None,
                port: None,
            } => connector.connect_sim().await,
            Strategy::Sim { ip_address, port } => {
                connector.connect_sim_to(ip_address.as_deref(), *port).await
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Auto => write!(f, "auto"),
            Strategy::Arq { ip_address: None } => write!(f, "arq(env)"),
            Strategy::Arq {
                ip_address: Some(ip),
            } => write!(f, "arq({})", ip),
            Strategy::Sim {
                ip_address: None,
                port: None,
            } => write!(f, "sim(env)"),
            Strategy::Sim { ip_address, port } => {
                let host = ip_address.as_deref().unwrap_or("?");
                match port {
                    Some(port) => write!(f, "sim({}:{})", host, port),
                    None => write!(f, "sim({}:?)", host),
                }
            }
        }
    }
}
