//! Client protocol engine for the phaser cavity-phasing server.
//!
//! A single TCP connection carries two kinds of traffic at once: replies to
//! commands the operator issues, and notifications the server pushes about
//! the running job. This crate keeps them apart.
//!
//! - [`decode_line`] turns each inbound line into a JSON document.
//! - [`ProtocolDispatcher`] routes documents to response listeners or, after
//!   [`decode_notification`], to notification listeners.
//! - [`JsonCommandConsole`] implements [`CommandConsole`]: one command in
//!   flight at a time, each waiting a bounded time for its response.
//! - [`Session`] connects, wires these together on a reader thread and
//!   performs the start-up handshake.

mod cavity_cache;
mod console;
mod decoder;
mod dispatcher;
mod job;
mod listener;
mod notification;
mod session;
mod timestamp;
pub mod transport;

pub use cavity_cache::CavityCache;
pub use console::{
    Command, CommandConsole, CommandError, DEFAULT_RESPONSE_TIMEOUT, JsonCommandConsole, Response,
    ResponseFeeder,
};
pub use decoder::{DecodeError, Document, decode_line};
pub use dispatcher::ProtocolDispatcher;
pub use job::{
    JobField, JobInput, JobSpecification, MAX_MOMENTUM_ERROR, MIN_MOMENTUM_ERROR, ResultId,
    ValidationError,
};
pub use listener::{ListenerRegistry, NotificationListener, ResponseListener};
pub use notification::{
    JobNotification, JobState, Notification, NotificationDecodeError, UNPARSEABLE_MESSAGE,
    UNRECOGNISED_MESSAGE, decode_notification,
};
pub use session::{Session, SessionError, SessionSettings};
pub use timestamp::Timestamp;
pub use transport::LineSink;

#[cfg(test)]
mod tests;
