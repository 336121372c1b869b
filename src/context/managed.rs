//! Scope guard for an entered context

use super::ConnectionContext;
use crate::client::Connector;
use std::ops::{Deref, DerefMut};

/// Connection borrowed from an entered [`ConnectionContext`].
///
/// Dropping the guard exits the context and releases the connection.
pub struct ManagedConnection<'a, C: Connector> {
    context: &'a mut ConnectionContext<C>,
}

impl<'a, C: Connector> ManagedConnection<'a, C> {
    pub(super) fn new(context: &'a mut ConnectionContext<C>) -> Self {
        debug_assert!(context.is_entered());
        Self { context }
    }
}

impl<C: Connector> Deref for ManagedConnection<'_, C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        self.context
            .connection
            .as_ref()
            .expect("managed connection outlived its handle")
    }
}

impl<C: Connector> DerefMut for ManagedConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
            .connection
            .as_mut()
            .expect("managed connection outlived its handle")
    }
}

impl<C: Connector> Drop for ManagedConnection<'_, C> {
    fn drop(&mut self) {
        self.context.exit();
    }
}
