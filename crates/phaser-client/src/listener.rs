//! Listener capabilities and their registries.
//!
//! Listeners are owned elsewhere; registries only hold shared handles and
//! invoke them in registration order on the thread that delivers the
//! message.

use std::sync::{Arc, Mutex};

use crate::decoder::Document;
use crate::notification::Notification;

/// Receives every decoded notification.
pub trait NotificationListener: Send + Sync {
    /// Handles one notification.
    fn on_notification(&self, notification: &Notification);
}

/// Receives every response document, verbatim.
pub trait ResponseListener: Send + Sync {
    /// Handles one response document.
    fn on_response(&self, response: &Document);
}

impl<F> NotificationListener for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn on_notification(&self, notification: &Notification) {
        self(notification);
    }
}

impl<F> ResponseListener for F
where
    F: Fn(&Document) + Send + Sync,
{
    fn on_response(&self, response: &Document) {
        self(response);
    }
}

/// Append-only ordered collection of listeners.
///
/// Registration and fan-out share one lock, so a listener registered from
/// another thread while a message is being delivered first sees the following
/// message. Callbacks must not register listeners on the same registry.
pub struct ListenerRegistry<L: ?Sized> {
    listeners: Mutex<Vec<Arc<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Appends a listener; registering the same listener twice delivers
    /// every message to it twice.
    pub fn register(&self, listener: Arc<L>) {
        self.listeners
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(listener);
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes `deliver` for each listener in registration order.
    pub fn for_each(&self, mut deliver: impl FnMut(&L)) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        for listener in listeners.iter() {
            deliver(listener);
        }
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> std::fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
