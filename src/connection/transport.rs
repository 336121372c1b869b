//! TCP transport to a connection endpoint

use crate::{Error, Result};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Host and port of a backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Transport layer of an open connection
#[derive(Debug)]
pub struct Transport {
    stream: TcpStream,
    peer: Endpoint,
}

impl Transport {
    /// Connect via plain TCP, optionally bounded by `timeout`
    pub async fn connect_tcp(endpoint: &Endpoint, timeout: Option<Duration>) -> Result<Self> {
        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| Error::ConnectTimeout {
                    endpoint: endpoint.to_string(),
                    timeout,
                })??,
            None => connect.await?,
        };
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            peer: endpoint.clone(),
        })
    }

    /// Endpoint this transport was opened to
    pub fn peer(&self) -> &Endpoint {
        &self.peer
    }

    /// Local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }

    /// Write all bytes to the transport
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf).await?;
        Ok(())
    }

    /// Flush the transport
    pub async fn flush(&mut self) -> Result<()> {
        self.stream.flush().await?;
        Ok(())
    }

    /// Shutdown the transport
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Ask the OS for a currently unused loopback TCP port.
///
/// The port is released again before returning, so another process may grab
/// it in the meantime. Good enough for tests and for picking a daemon port.
pub fn unused_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}
