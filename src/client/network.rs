//! NetworkConnector implementation

use super::connector::Connector;
use crate::connection::{
    ArqConnection, Connection, ConnectionConfig, Endpoint, QuiggeldyClient, SimConnection,
};
use crate::env::{BackendSelection, Environment};
use crate::{Error, Result};
use tracing::Instrument;

/// Connector opening TCP transports to the endpoints named by the
/// environment or by explicit arguments.
///
/// Unless a fixed [`Environment`] is given, the process environment is read
/// anew on every connect.
#[derive(Debug, Clone, Default)]
pub struct NetworkConnector {
    config: ConnectionConfig,
    env: Option<Environment>,
}

impl NetworkConnector {
    /// Connector with default configuration reading the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector with custom configuration
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() -> hxcomm_context::Result<()> {
    /// use hxcomm_context::{ConnectionConfig, Connector, NetworkConnector};
    /// use std::time::Duration;
    ///
    /// let config = ConnectionConfig::builder()
    ///     .connect_timeout(Duration::from_secs(5))
    ///     .build();
    /// let connection = NetworkConnector::with_config(config).connect_from_env().await?;
    /// println!("connected via {}", connection.name());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self { config, env: None }
    }

    /// Use a fixed environment instead of the process environment
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Connection configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Environment used for the next connect
    pub fn environment(&self) -> Environment {
        self.env.clone().unwrap_or_else(Environment::from_process)
    }

    /// Connect to a selected backend
    pub async fn connect(&self, selection: &BackendSelection) -> Result<Connection> {
        let connection = match selection {
            BackendSelection::Quiggeldy(endpoint) => {
                QuiggeldyClient::connect_to(endpoint, &self.config)
                    .await?
                    .into()
            }
            BackendSelection::Hardware { ip } => {
                ArqConnection::connect_to(ip, &self.config).await?.into()
            }
            BackendSelection::Simulation(endpoint) => {
                SimConnection::connect_to(endpoint, &self.config)
                    .await?
                    .into()
            }
        };
        Ok(connection)
    }

    /// Connect to every backend the environment offers.
    ///
    /// One connection per listed FPGA, otherwise a single daemon or simulator
    /// connection. If any connect fails, the already opened ones are released.
    pub async fn connection_list_from_env(&self, limit: Option<usize>) -> Result<Vec<Connection>> {
        let selections = self.environment().select_backends(limit)?;
        let mut connections = Vec::with_capacity(selections.len());
        for selection in &selections {
            connections.push(self.connect(selection).await?);
        }
        Ok(connections)
    }
}

impl Connector for NetworkConnector {
    type Connection = Connection;

    async fn connect_from_env(&self) -> Result<Connection> {
        let selection = self.environment().select_backend()?;
        tracing::debug!(?selection, "selected backend from environment");
        self.connect(&selection)
            .instrument(tracing::debug_span!("connect_from_env"))
            .await
    }

    async fn connect_arq(&self) -> Result<Connection> {
        let connection = ArqConnection::connect(&self.environment(), &self.config).await?;
        Ok(connection.into())
    }

    async fn connect_arq_to(&self, ip_address: &str) -> Result<Connection> {
        let connection = ArqConnection::connect_to(ip_address, &self.config).await?;
        Ok(connection.into())
    }

    async fn connect_sim(&self) -> Result<Connection> {
        let connection = SimConnection::connect(&self.environment(), &self.config).await?;
        Ok(connection.into())
    }

    async fn connect_sim_to(
        &self,
        ip_address: Option<&str>,
        port: Option<u16>,
    ) -> Result<Connection> {
        match (ip_address, port) {
            (Some(ip_address), Some(port)) => {
                let endpoint = Endpoint::new(ip_address, port);
                let connection = SimConnection::connect_to(&endpoint, &self.config).await?;
                Ok(connection.into())
            }
            _ => Err(Error::Config(format!(
                "simulator connection needs both an IP address and a port (got ip={:?}, port={:?})",
                ip_address, port
            ))),
        }
    }
}
