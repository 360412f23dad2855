//! Classification and fan-out of inbound protocol documents.

use std::sync::Arc;

use tracing::{error, trace};

use crate::decoder::{DecodeError, Document, decode_line};
use crate::listener::{ListenerRegistry, NotificationListener, ResponseListener};
use crate::notification::{
    Notification, UNPARSEABLE_MESSAGE, UNRECOGNISED_MESSAGE, decode_notification,
};

/// Tracing target for dispatch decisions.
pub(crate) const DISPATCH_TARGET: &str = "phaser_client::dispatcher";

const RESPONSE_KEY: &str = "response";
const NOTIFICATION_KEY: &str = "notification";

/// Routes each inbound document to response or notification listeners.
///
/// Delivery is synchronous on the calling thread, so every listener sees
/// message `N` before any listener sees message `N + 1`.
#[derive(Debug, Default)]
pub struct ProtocolDispatcher {
    notification_listeners: ListenerRegistry<dyn NotificationListener>,
    response_listeners: ListenerRegistry<dyn ResponseListener>,
}

impl ProtocolDispatcher {
    /// Creates a dispatcher with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a notification listener after those already present.
    pub fn add_notification_listener(&self, listener: Arc<dyn NotificationListener>) {
        self.notification_listeners.register(listener);
    }

    /// Registers a response listener after those already present.
    pub fn add_response_listener(&self, listener: Arc<dyn ResponseListener>) {
        self.response_listeners.register(listener);
    }

    /// Decodes one framed line and dispatches it.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the line is not a JSON object. Callers
    /// treat this as fatal to the connection.
    pub fn dispatch_line(&self, line: &str) -> Result<(), DecodeError> {
        let document = decode_line(line)?;
        self.dispatch(&document);
        Ok(())
    }

    /// Dispatches one decoded document. Never fails; protocol anomalies are
    /// logged and reported to notification listeners as error statuses.
    pub fn dispatch(&self, document: &Document) {
        if document.contains_key(RESPONSE_KEY) {
            trace!(target: DISPATCH_TARGET, "delivering response");
            self.response_listeners
                .for_each(|listener| listener.on_response(document));
        } else if document.contains_key(NOTIFICATION_KEY) {
            self.dispatch_notification(document);
        } else {
            error!(
                target: DISPATCH_TARGET,
                document = %serde_json::Value::Object(document.clone()),
                "unrecognised message"
            );
            self.notify(&Notification::status_error(UNRECOGNISED_MESSAGE));
        }
    }

    fn dispatch_notification(&self, document: &Document) {
        match decode_notification(document) {
            Ok(notification) => {
                trace!(
                    target: DISPATCH_TARGET,
                    kind = notification.kind(),
                    "delivering notification"
                );
                self.notify(&notification);
            }
            Err(decode_error) if decode_error.is_unknown_type() => {
                error!(
                    target: DISPATCH_TARGET,
                    error = %decode_error,
                    "dropping notification"
                );
            }
            Err(decode_error) => {
                error!(
                    target: DISPATCH_TARGET,
                    error = %decode_error,
                    "unable to parse server notification"
                );
                self.notify(&Notification::status_error(UNPARSEABLE_MESSAGE));
            }
        }
    }

    fn notify(&self, notification: &Notification) {
        self.notification_listeners
            .for_each(|listener| listener.on_notification(notification));
    }
}
