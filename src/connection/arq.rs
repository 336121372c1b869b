//! HostARQ connection to an FPGA

use super::conn::{link_handle, ConnectionConfig, Link};
use super::transport::Endpoint;
use crate::env::Environment;
use crate::metrics::labels;
use crate::Result;

/// Connection to an FPGA via HostARQ.
///
/// Not default-constructible; a value always holds an open connection:
///
/// ```compile_fail
/// let connection = hxcomm_context::ArqConnection::default();
/// ```
#[derive(Debug)]
pub struct ArqConnection {
    pub(crate) link: Link,
}

impl ArqConnection {
    /// Connect to the single FPGA listed in the environment.
    ///
    /// Fails if the environment lists no FPGA or more than one.
    pub async fn connect(env: &Environment, config: &ConnectionConfig) -> Result<Self> {
        let ip = env.fpga_ip()?;
        Self::connect_to(&ip, config).await
    }

    /// Connect to the FPGA at `ip`
    pub async fn connect_to(ip: &str, config: &ConnectionConfig) -> Result<Self> {
        let endpoint = Endpoint::new(ip, config.arq_port);
        let link = Link::open(labels::KIND_ARQ, &endpoint, config).await?;
        Ok(Self { link })
    }

    /// IP address of the FPGA
    pub fn ip(&self) -> &str {
        &self.link.peer().host
    }
}

link_handle!(ArqConnection, "ARQConnection", [super::Target::Hardware]);
