//! Client of the Quiggeldy scheduling daemon

use super::conn::{link_handle, ConnectionConfig, Link};
use super::transport::Endpoint;
use crate::env::Environment;
use crate::metrics::labels;
use crate::{Error, Result};

/// Connection to hardware through a Quiggeldy daemon.
///
/// Connecting retries up to `ConnectionConfig::connection_attempts_max`
/// times, since the daemon may still be starting up.
///
/// ```compile_fail
/// let client = hxcomm_context::QuiggeldyClient::default();
/// ```
#[derive(Debug)]
pub struct QuiggeldyClient {
    pub(crate) link: Link,
}

impl QuiggeldyClient {
    /// Connect to the daemon named by the environment
    pub async fn connect(env: &Environment, config: &ConnectionConfig) -> Result<Self> {
        let endpoint = env.quiggeldy_parameters()?.ok_or_else(|| {
            Error::Environment("Quiggeldy is not enabled in environment".into())
        })?;
        Self::connect_to(&endpoint, config).await
    }

    /// Connect to the daemon at `endpoint`
    pub async fn connect_to(endpoint: &Endpoint, config: &ConnectionConfig) -> Result<Self> {
        let attempts = config.connection_attempts_max.max(1);
        let mut attempt = 1;
        loop {
            match Link::open(labels::KIND_QUIGGELDY, endpoint, config).await {
                Ok(link) => return Ok(Self { link }),
                Err(e) if e.is_transient() && attempt < attempts => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        endpoint = %endpoint,
                        error = %e,
                        "connection to quiggeldy failed, retrying"
                    );
                    tokio::time::sleep(config.connection_attempt_wait_after).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(Error::AttemptsExhausted {
                        endpoint: endpoint.to_string(),
                        attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

link_handle!(QuiggeldyClient, "QuiggeldyClient", [super::Target::Hardware]);
