//! Single-capacity hand-off between the network thread and the waiting caller.
//!
//! The protocol carries no request id, so a response is attributed to
//! whichever command is outstanding when it arrives. The feeder refuses
//! responses while nothing is outstanding and never blocks the network
//! thread; the console drains leftovers before each new command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use tracing::{error, warn};

use super::CONSOLE_TARGET;
use crate::decoder::Document;
use crate::listener::ResponseListener;

/// Producer side of the pending-response slot.
///
/// Register it with the dispatcher as a response listener. Dropping it (for
/// example when the reader thread exits) wakes a waiting caller with
/// [`CommandError::Interrupted`](super::CommandError::Interrupted).
#[derive(Debug)]
pub struct ResponseFeeder {
    sender: SyncSender<Document>,
    awaiting: Arc<AtomicBool>,
}

/// Consumer side of the pending-response slot.
#[derive(Debug)]
pub(crate) struct ResponseSlot {
    receiver: Receiver<Document>,
    awaiting: Arc<AtomicBool>,
}

/// Marks the slot as awaiting a response until dropped.
pub(crate) struct AwaitingGuard<'a> {
    awaiting: &'a AtomicBool,
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        self.awaiting.store(false, Ordering::SeqCst);
    }
}

pub(crate) fn pending_response() -> (ResponseSlot, ResponseFeeder) {
    let (sender, receiver) = mpsc::sync_channel(1);
    let awaiting = Arc::new(AtomicBool::new(false));
    (
        ResponseSlot {
            receiver,
            awaiting: Arc::clone(&awaiting),
        },
        ResponseFeeder { sender, awaiting },
    )
}

impl ResponseSlot {
    /// Discards responses left over from earlier commands.
    pub(crate) fn drain_stray(&self) -> usize {
        let mut discarded = 0;
        while let Ok(response) = self.receiver.try_recv() {
            discarded += 1;
            error!(
                target: CONSOLE_TARGET,
                response = %serde_json::Value::Object(response),
                "discarding stray response"
            );
        }
        discarded
    }

    /// Opens the window in which the feeder accepts a response.
    pub(crate) fn begin(&self) -> AwaitingGuard<'_> {
        self.awaiting.store(true, Ordering::SeqCst);
        AwaitingGuard {
            awaiting: &self.awaiting,
        }
    }

    /// Blocks until a response arrives, the timeout expires or the feeder is
    /// dropped.
    pub(crate) fn wait(&self, timeout: Duration) -> Result<Document, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

impl ResponseListener for ResponseFeeder {
    fn on_response(&self, response: &Document) {
        if !self.awaiting.load(Ordering::SeqCst) {
            warn!(
                target: CONSOLE_TARGET,
                response = %serde_json::Value::Object(response.clone()),
                "discarding response received while no command is outstanding"
            );
            return;
        }
        match self.sender.try_send(response.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(extra)) => {
                error!(
                    target: CONSOLE_TARGET,
                    response = %serde_json::Value::Object(extra),
                    "discarding response: one is already pending"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(
                    target: CONSOLE_TARGET,
                    "discarding response: console is gone"
                );
            }
        }
    }
}
