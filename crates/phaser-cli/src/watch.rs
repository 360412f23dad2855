//! `phaserctl watch`: print notifications as they arrive.
//!
//! Notifications are delivered on the connection's reader thread. They are
//! forwarded over a channel so only the calling thread writes to stdout; the
//! channel closes when the reader thread drops its listeners.

use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use phaser_client::transport::ReaderExit;
use phaser_client::{Notification, NotificationListener, Session, SessionSettings};
use tracing::{debug, info};

use crate::{AppError, CLI_TARGET};

struct Forwarder {
    sender: Sender<Notification>,
}

impl NotificationListener for Forwarder {
    fn on_notification(&self, notification: &Notification) {
        if self.sender.send(notification.clone()).is_err() {
            debug!(target: CLI_TARGET, "watch output closed; dropping notification");
        }
    }
}

fn forwarder() -> (Arc<dyn NotificationListener>, Receiver<Notification>) {
    let (sender, receiver) = mpsc::channel();
    (Arc::new(Forwarder { sender }), receiver)
}

pub(crate) fn run<W: Write>(settings: &SessionSettings, stdout: &mut W) -> Result<(), AppError> {
    let (listener, notifications) = forwarder();
    let session = Session::open(settings, vec![listener])?;
    info!(
        target: CLI_TARGET,
        version = session.server_version(),
        cavities = session.cavities().len(),
        "watching"
    );

    for notification in notifications {
        writeln!(stdout, "{notification}")?;
        stdout.flush()?;
    }

    match session.wait() {
        ReaderExit::Closed => Ok(()),
        ReaderExit::Failed(error) => Err(AppError::Connection(error)),
        ReaderExit::Panicked => Err(AppError::ReaderPanicked),
    }
}
