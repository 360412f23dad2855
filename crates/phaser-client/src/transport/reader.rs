//! Inbound line framing and the network delivery thread.

use std::io::{self, BufRead, BufReader, Read};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, trace, warn};

use super::{TRANSPORT_TARGET, TransportError};
use crate::dispatcher::ProtocolDispatcher;

const READER_THREAD_NAME: &str = "phaser-reader";

/// Why the reader loop stopped.
#[derive(Debug)]
pub enum ReaderExit {
    /// The server closed the connection, or it was shut down locally.
    Closed,
    /// A transport or framing failure ended the connection.
    Failed(TransportError),
    /// The reader thread panicked.
    Panicked,
}

impl ReaderExit {
    /// Whether the connection ended without error.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Handle to a running reader thread.
#[derive(Debug)]
pub struct ReaderHandle {
    handle: thread::JoinHandle<ReaderExit>,
}

impl ReaderHandle {
    /// Waits for the reader thread to finish.
    #[must_use]
    pub fn join(self) -> ReaderExit {
        self.handle.join().unwrap_or(ReaderExit::Panicked)
    }

    /// Whether the reader thread has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Starts the network delivery thread for `stream`.
///
/// The thread owns the dispatcher handle it is given; once it exits, any
/// response listener registered on that dispatcher is dropped with it. A
/// failed connection is shut down before the thread returns.
///
/// # Errors
///
/// Returns the I/O error when the thread cannot be spawned.
pub fn spawn_reader(
    stream: TcpStream,
    dispatcher: Arc<ProtocolDispatcher>,
    max_frame_length: usize,
) -> io::Result<ReaderHandle> {
    let handle = thread::Builder::new()
        .name(READER_THREAD_NAME.to_owned())
        .spawn(move || {
            let exit = read_lines(&stream, &dispatcher, max_frame_length);
            if let Err(error) = stream.shutdown(Shutdown::Both) {
                trace!(target: TRANSPORT_TARGET, %error, "socket already closed");
            }
            exit
        })?;
    Ok(ReaderHandle { handle })
}

/// Reads newline-delimited frames from `source` and dispatches each one
/// until the stream ends or a frame is rejected.
///
/// Trailing carriage returns are stripped and blank lines are skipped.
pub fn read_lines<R: Read>(
    source: R,
    dispatcher: &ProtocolDispatcher,
    max_frame_length: usize,
) -> ReaderExit {
    let mut reader = BufReader::new(source);
    let mut frame = Vec::new();
    loop {
        match next_line(&mut reader, &mut frame, max_frame_length, dispatcher) {
            Ok(true) => {}
            Ok(false) => {
                info!(target: TRANSPORT_TARGET, "server closed the connection");
                return ReaderExit::Closed;
            }
            Err(error) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "closing connection"
                );
                return ReaderExit::Failed(error);
            }
        }
    }
}

fn next_line<R: BufRead>(
    reader: &mut R,
    frame: &mut Vec<u8>,
    limit: usize,
    dispatcher: &ProtocolDispatcher,
) -> Result<bool, TransportError> {
    if !read_frame(reader, frame, limit)? {
        return Ok(false);
    }
    if frame.last() == Some(&b'\r') {
        frame.pop();
    }
    let line = std::str::from_utf8(frame)?;
    if line.trim().is_empty() {
        trace!(target: TRANSPORT_TARGET, "skipping blank line");
        return Ok(true);
    }
    trace!(target: TRANSPORT_TARGET, line, "line received");
    dispatcher.dispatch_line(line)?;
    Ok(true)
}

/// Fills `frame` with the next line, without its `\n`.
///
/// Returns `false` at end of stream. An unterminated trailing fragment is
/// discarded.
fn read_frame<R: BufRead>(
    reader: &mut R,
    frame: &mut Vec<u8>,
    limit: usize,
) -> Result<bool, TransportError> {
    frame.clear();
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        };
        if available.is_empty() {
            if !frame.is_empty() {
                debug!(
                    target: TRANSPORT_TARGET,
                    bytes = frame.len(),
                    "discarding unterminated line at end of stream"
                );
            }
            return Ok(false);
        }

        let (consumed, complete) = match available.iter().position(|byte| *byte == b'\n') {
            Some(end) => {
                let (line, _) = available.split_at(end);
                frame.extend_from_slice(line);
                (end + 1, true)
            }
            None => {
                frame.extend_from_slice(available);
                (available.len(), false)
            }
        };
        reader.consume(consumed);

        if frame.len() > limit {
            return Err(TransportError::FrameTooLong { limit });
        }
        if complete {
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;

    use rstest::rstest;

    use super::*;
    use crate::notification::Notification;

    fn recording_dispatcher() -> (ProtocolDispatcher, Arc<Mutex<Vec<Notification>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = ProtocolDispatcher::new();
        let sink = Arc::clone(&seen);
        dispatcher.add_notification_listener(Arc::new(move |notification: &Notification| {
            sink.lock().expect("lock").push(notification.clone());
        }));
        (dispatcher, seen)
    }

    #[rstest]
    fn dispatches_lines_until_end_of_stream() {
        let (dispatcher, seen) = recording_dispatcher();
        let input = "{\"notification\":\"loop\",\"count\":1}\r\n\n{\"notification\":\"loop\",\"count\":2}\n";

        let exit = read_lines(Cursor::new(input), &dispatcher, 1024);

        assert!(exit.is_clean());
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![
                Notification::Loop { count: Some(1) },
                Notification::Loop { count: Some(2) },
            ]
        );
    }

    #[rstest]
    fn malformed_lines_end_the_connection() {
        let (dispatcher, seen) = recording_dispatcher();
        let input = "{oops\n{\"notification\":\"loop\",\"count\":2}\n";

        let exit = read_lines(Cursor::new(input), &dispatcher, 1024);

        assert!(matches!(exit, ReaderExit::Failed(TransportError::Decode(_))));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[rstest]
    fn oversize_frames_end_the_connection() {
        let (dispatcher, _) = recording_dispatcher();
        let input = format!("{{\"notification\":\"status\",\"message\":\"{}\"}}\n", "x".repeat(64));

        let exit = read_lines(Cursor::new(input), &dispatcher, 32);

        assert!(matches!(
            exit,
            ReaderExit::Failed(TransportError::FrameTooLong { limit: 32 })
        ));
    }

    #[rstest]
    fn invalid_utf8_ends_the_connection() {
        let (dispatcher, _) = recording_dispatcher();
        let input: &[u8] = b"{\"notification\":\"status\",\"message\":\"\xff\"}\n";

        let exit = read_lines(input, &dispatcher, 1024);

        assert!(matches!(exit, ReaderExit::Failed(TransportError::InvalidUtf8(_))));
    }

    #[rstest]
    fn discards_unterminated_trailing_fragment() {
        let (dispatcher, seen) = recording_dispatcher();

        let exit = read_lines(
            Cursor::new("{\"notification\":\"loop\",\"count\":1}"),
            &dispatcher,
            1024,
        );

        assert!(exit.is_clean());
        assert!(seen.lock().expect("lock").is_empty());
    }
}
