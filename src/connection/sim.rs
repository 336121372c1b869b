//! Connection to a simulator

use super::conn::{link_handle, ConnectionConfig, Link};
use super::transport::Endpoint;
use crate::env::Environment;
use crate::metrics::labels;
use crate::Result;

/// Connection to a simulation server.
///
/// ```compile_fail
/// let connection = hxcomm_context::SimConnection::default();
/// ```
#[derive(Debug)]
pub struct SimConnection {
    pub(crate) link: Link,
}

impl SimConnection {
    /// Connect to the simulator named by the environment.
    ///
    /// The host defaults to `127.0.0.1`; the port must be set.
    pub async fn connect(env: &Environment, config: &ConnectionConfig) -> Result<Self> {
        let endpoint = env.sim_parameters()?;
        Self::connect_to(&endpoint, config).await
    }

    /// Connect to the simulator at `endpoint`
    pub async fn connect_to(endpoint: &Endpoint, config: &ConnectionConfig) -> Result<Self> {
        let link = Link::open(labels::KIND_SIM, endpoint, config).await?;
        Ok(Self { link })
    }
}

link_handle!(SimConnection, "SimConnection", [super::Target::Simulation]);
