//! Scoped connection acquisition
//!
//! A [`ConnectionContext`] holds at most one connection handle. Entering
//! asks its [`Strategy`] for a handle; exiting drops it. [`ManagedConnection`]
//! and [`ConnectionContext::run`] tie the exit to scope end so the handle is
//! released on every path, including errors and panics.

mod managed;
mod strategy;

pub use managed::ManagedConnection;
pub use strategy::Strategy;

use crate::client::{Connector, NetworkConnector};
use crate::metrics::counters;
use crate::{Error, Result};
use futures::future::BoxFuture;
use tracing::Instrument;

/// Context manager for one connection.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> hxcomm_context::Result<()> {
/// use hxcomm_context::ConnectionContext;
///
/// let mut context = ConnectionContext::arq(Some("192.168.4.11".into()));
/// {
///     let mut connection = context.scope().await?;
///     connection.commit(b"\x00\x01").await?;
/// } // connection released here
///
/// // A context can be entered again once released
/// let connection = context.enter().await?;
/// println!("{}", connection.time_info());
/// context.exit();
/// # Ok(())
/// # }
/// ```
pub struct ConnectionContext<C: Connector = NetworkConnector> {
    strategy: Strategy,
    connector: C,
    connection: Option<C::Connection>,
}

impl ConnectionContext<NetworkConnector> {
    /// Context that lets the environment pick the backend
    pub fn auto() -> Self {
        Self::with_connector(Strategy::Auto, NetworkConnector::new())
    }

    /// Context connecting to an FPGA.
    ///
    /// Without an IP address, the FPGA is taken from the environment.
    pub fn arq(ip_address: Option<String>) -> Self {
        Self::with_connector(Strategy::Arq { ip_address }, NetworkConnector::new())
    }

    /// Context connecting to a simulator.
    ///
    /// Without IP address and port, both are taken from the environment.
    pub fn sim(ip_address: Option<String>, port: Option<u16>) -> Self {
        Self::with_connector(Strategy::Sim { ip_address, port }, NetworkConnector::new())
    }
}

impl<C: Connector> ConnectionContext<C> {
    /// Context using `connector` to create connections
    pub fn with_connector(strategy: Strategy, connector: C) -> Self {
        Self {
            strategy,
            connector,
            connection: None,
        }
    }

    /// How this context connects
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Connector used by this context
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Whether a connection is currently held
    pub fn is_entered(&self) -> bool {
        self.connection.is_some()
    }

    /// Held connection, if any
    pub fn connection(&self) -> Option<&C::Connection> {
        self.connection.as_ref()
    }

    /// Establish the connection and return it.
    ///
    /// Connection failures are returned unchanged. Entering a context that
    /// already holds a connection is an error and leaves the held connection
    /// untouched.
    pub async fn enter(&mut self) -> Result<&mut C::Connection> {
        if self.connection.is_some() {
            return Err(Error::InvalidState {
                expected: "context without connection".into(),
                actual: "context already holds a connection".into(),
            });
        }

        let connection = self
            .strategy
            .connect(&self.connector)
            .instrument(tracing::debug_span!("enter", strategy = %self.strategy))
            .await?;
        counters::context_entered(self.strategy.label());
        tracing::debug!(strategy = %self.strategy, "entered connection context");

        Ok(self.connection.insert(connection))
    }

    /// Release the held connection.
    ///
    /// # Panics
    ///
    /// Panics if no connection is held, i.e. the context was not entered.
    pub fn exit(&mut self) {
        let connection = self.connection.take();
        assert!(
            connection.is_some(),
            "exit() called on a connection context that was not entered"
        );
        drop(connection);
        counters::context_exited(self.strategy.label());
        tracing::debug!(strategy = %self.strategy, "exited connection context");
    }

    /// Enter and return a guard that exits when dropped
    pub async fn scope(&mut self) -> Result<ManagedConnection<'_, C>> {
        self.enter().await?;
        Ok(ManagedConnection::new(self))
    }

    /// Enter, run `f` on the connection and exit again.
    ///
    /// The connection is released whether `f` succeeds, fails or panics.
    ///
    /// ```no_run
    /// # async fn example() -> hxcomm_context::Result<()> {
    /// use futures::FutureExt;
    /// use hxcomm_context::ConnectionContext;
    ///
    /// let mut context = ConnectionContext::auto();
    /// let time_info = context
    ///     .run(|connection| async move { Ok(connection.time_info()) }.boxed())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<T, F>(&mut self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, Result<T>>,
    {
        let mut managed = self.scope().await?;
        let result = f(&mut *managed).await;
        drop(managed);
        result
    }
}

impl<C> std::fmt::Debug for ConnectionContext<C>
where
    C: Connector + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("strategy", &self.strategy)
            .field("connector", &self.connector)
            .field("entered", &self.is_entered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_strategy() {
        assert_eq!(ConnectionContext::auto().strategy(), &Strategy::Auto);
        assert_eq!(
            ConnectionContext::arq(Some("10.0.0.1".into())).strategy(),
            &Strategy::Arq {
                ip_address: Some("10.0.0.1".into())
            }
        );
        assert_eq!(
            ConnectionContext::sim(None, Some(50051)).strategy(),
            &Strategy::Sim {
                ip_address: None,
                port: Some(50051)
            }
        );
    }

    #[test]
    fn test_new_context_is_not_entered() {
        let context = ConnectionContext::auto();
        assert!(!context.is_entered());
        assert!(context.connection().is_none());
    }

    #[test]
    #[should_panic(expected = "not entered")]
    fn test_exit_without_enter_panics() {
        let mut context = ConnectionContext::sim(None, None);
        context.exit();
    }

    mod mock {
        use crate::client::Connector;
        use crate::{Error, Result};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::{Arc, Mutex};

        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Call {
            FromEnv,
            Arq,
            ArqTo(String),
            Sim,
            SimTo(Option<String>, Option<u16>),
        }

        #[derive(Debug)]
        pub struct Handle {
            pub id: usize,
            drops: Arc<AtomicUsize>,
        }

        impl Drop for Handle {
            fn drop(&mut self) {
                self.drops.fetch_add(1, Ordering::SeqCst);
            }
        }

        #[derive(Debug, Default, Clone)]
        pub struct MockConnector {
            pub calls: Arc<Mutex<Vec<Call>>>,
            pub drops: Arc<AtomicUsize>,
            pub fail: bool,
        }

        impl MockConnector {
            pub fn failing() -> Self {
                Self {
                    fail: true,
                    ..Self::default()
                }
            }

            pub fn calls(&self) -> Vec<Call> {
                self.calls.lock().unwrap().clone()
            }

            pub fn drops(&self) -> usize {
                self.drops.load(Ordering::SeqCst)
            }

            fn make(&self, call: Call) -> Result<Handle> {
                let mut calls = self.calls.lock().unwrap();
                calls.push(call);
                if self.fail {
                    return Err(Error::Environment("mock failure".into()));
                }
                Ok(Handle {
                    id: calls.len(),
                    drops: Arc::clone(&self.drops),
                })
            }
        }

        impl Connector for MockConnector {
            type Connection = Handle;

            async fn connect_from_env(&self) -> Result<Handle> {
                self.make(Call::FromEnv)
            }

            async fn connect_arq(&self) -> Result<Handle> {
                self.make(Call::Arq)
            }

            async fn connect_arq_to(&self, ip_address: &str) -> Result<Handle> {
                self.make(Call::ArqTo(ip_address.to_string()))
            }

            async fn connect_sim(&self) -> Result<Handle> {
                self.make(Call::Sim)
            }

            async fn connect_sim_to(
                &self,
                ip_address: Option<&str>,
                port: Option<u16>,
            ) -> Result<Handle> {
                self.make(Call::SimTo(ip_address.map(str::to_string), port))
            }
        }
    }

    use futures::FutureExt;
    use mock::{Call, MockConnector};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    async fn enter_once(strategy: Strategy) -> Vec<Call> {
        let connector = MockConnector::default();
        let mut context = ConnectionContext::with_connector(strategy, connector.clone());
        context.enter().await.unwrap();
        context.exit();
        connector.calls()
    }

    #[tokio::test]
    async fn test_auto_uses_environment_selector() {
        assert_eq!(enter_once(Strategy::Auto).await, vec![Call::FromEnv]);
    }

    #[tokio::test]
    async fn test_arq_routing() {
        assert_eq!(
            enter_once(Strategy::Arq { ip_address: None }).await,
            vec![Call::Arq]
        );
        assert_eq!(
            enter_once(Strategy::Arq {
                ip_address: Some("192.168.4.11".into())
            })
            .await,
            vec![Call::ArqTo("192.168.4.11".into())]
        );
    }

    #[tokio::test]
    async fn test_sim_routing() {
        assert_eq!(
            enter_once(Strategy::Sim {
                ip_address: None,
                port: None
            })
            .await,
            vec![Call::Sim]
        );
        assert_eq!(
            enter_once(Strategy::Sim {
                ip_address: Some("sim.local".into()),
                port: Some(50051)
            })
            .await,
            vec![Call::SimTo(Some("sim.local".into()), Some(50051))]
        );
    }

    #[tokio::test]
    async fn test_sim_half_specified_is_passed_through() {
        assert_eq!(
            enter_once(Strategy::Sim {
                ip_address: Some("sim.local".into()),
                port: None
            })
            .await,
            vec![Call::SimTo(Some("sim.local".into()), None)]
        );
        assert_eq!(
            enter_once(Strategy::Sim {
                ip_address: None,
                port: Some(50051)
            })
            .await,
            vec![Call::SimTo(None, Some(50051))]
        );
    }

    #[tokio::test]
    async fn test_enter_holds_handle_until_exit() {
        let connector = MockConnector::default();
        let mut context = ConnectionContext::with_connector(Strategy::Auto, connector.clone());

        assert_eq!(context.enter().await.unwrap().id, 1);
        assert!(context.is_entered());
        assert_eq!(connector.drops(), 0);

        context.exit();
        assert!(!context.is_entered());
        assert_eq!(connector.drops(), 1);
    }

    #[tokio::test]
    async fn test_enter_twice_is_rejected() {
        let connector = MockConnector::default();
        let mut context = ConnectionContext::with_connector(Strategy::Auto, connector.clone());
        context.enter().await.unwrap();

        let err = context.enter().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        // first handle is untouched and no second connect happened
        assert_eq!(connector.calls().len(), 1);
        assert_eq!(connector.drops(), 0);
        assert_eq!(context.connection().map(|handle| handle.id), Some(1));
    }

    #[tokio::test]
    async fn test_reenter_after_exit_gets_new_handle() {
        let cases = [
            (Strategy::Auto, Call::FromEnv),
            (
                Strategy::Arq {
                    ip_address: Some("10.0.0.1".into()),
                },
                Call::ArqTo("10.0.0.1".into()),
            ),
            (
                Strategy::Sim {
                    ip_address: None,
                    port: None,
                },
                Call::Sim,
            ),
        ];

        for (strategy, call) in cases {
            let connector = MockConnector::default();
            let mut context = ConnectionContext::with_connector(strategy, connector.clone());

            context.enter().await.unwrap();
            context.exit();
            assert!(!context.is_entered());
            assert_eq!(context.enter().await.unwrap().id, 2);
            context.exit();

            assert_eq!(connector.calls(), vec![call.clone(), call]);
            assert_eq!(connector.drops(), 2);
        }
    }

    #[tokio::test]
    async fn test_failed_enter_propagates_and_holds_nothing() {
        let connector = MockConnector::failing();
        let mut context = ConnectionContext::with_connector(Strategy::Auto, connector.clone());

        let err = context.enter().await.unwrap_err();
        assert!(matches!(err, Error::Environment(_)));
        assert!(!context.is_entered());
    }

    #[tokio::test]
    async fn test_scope_releases_on_drop() {
        let connector = MockConnector::default();
        let mut context = ConnectionContext::with_connector(
            Strategy::Arq { ip_address: None },
            connector.clone(),
        );

        {
            let managed = context.scope().await.unwrap();
            assert_eq!(managed.id, 1);
            assert_eq!(connector.drops(), 0);
        }

        assert_eq!(connector.drops(), 1);
        assert!(!context.is_entered());
    }

    #[tokio::test]
    async fn test_run_releases_on_error() {
        let connector = MockConnector::default();
        let mut context = ConnectionContext::with_connector(Strategy::Auto, connector.clone());

        let result: Result<()> = context
            .run(|_| async { Err(Error::ConnectionClosed) }.boxed())
            .await;

        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert_eq!(connector.drops(), 1);
        assert!(!context.is_entered());
    }

    #[tokio::test]
    async fn test_run_returns_body_value() {
        let connector = MockConnector::default();
        let mut context = ConnectionContext::with_connector(Strategy::Auto, connector.clone());

        let id = context
            .run(|handle| async move { Ok(handle.id) }.boxed())
            .await
            .unwrap();

        assert_eq!(id, 1);
        assert_eq!(connector.drops(), 1);
    }

    #[tokio::test]
    async fn test_scope_releases_on_panic() {
        let connector = MockConnector::default();
        let drops = Arc::clone(&connector.drops);

        let task = tokio::spawn(async move {
            let mut context = ConnectionContext::with_connector(Strategy::Auto, connector);
            let _managed = context.scope().await.unwrap();
            panic!("body failed");
        });

        assert!(task.await.unwrap_err().is_panic());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
