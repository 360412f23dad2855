//! Shared fakes for console and session tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::console::{JsonCommandConsole, ResponseFeeder};
use crate::decoder::{Document, decode_line};
use crate::listener::{NotificationListener, ResponseListener};
use crate::notification::Notification;
use crate::transport::LineSink;

/// Builds a document from a JSON object literal.
pub(crate) fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// What the scripted server does with the next command.
pub(crate) enum Reply {
    /// Answer before `send_line` returns.
    Now(Document),
    /// Answer from another thread after a delay.
    After(Duration, Document),
    /// Never answer.
    Silence,
    /// Fail the write.
    WriteFailure,
}

/// In-memory [`LineSink`] that answers commands from a script.
///
/// Once the script runs out it answers `{"response":"ok"}`.
pub(crate) struct ScriptedSink {
    events: Arc<Mutex<Vec<String>>>,
    replies: Mutex<VecDeque<Reply>>,
    feeder: Arc<OnceLock<ResponseFeeder>>,
}

impl ScriptedSink {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            events: Arc::new(Mutex::new(Vec::new())),
            replies: Mutex::new(replies.into_iter().collect()),
            feeder: Arc::new(OnceLock::new()),
        })
    }

    /// Builds a console wired to this sink.
    pub(crate) fn console(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> JsonCommandConsole<Arc<ScriptedSink>> {
        let (console, feeder) = JsonCommandConsole::new(Arc::clone(self), timeout);
        assert!(self.feeder.set(feeder).is_ok(), "console already attached");
        console
    }

    /// Delivers a response as though the server had sent it unprompted.
    pub(crate) fn deliver(&self, response: &Document) {
        if let Some(feeder) = self.feeder.get() {
            feeder.on_response(response);
        }
    }

    /// Ordered log of `sent <line>` and `reply <line>` events.
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    /// Lines written so far.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| event.strip_prefix("sent ").map(str::to_owned))
            .collect()
    }
}

impl LineSink for ScriptedSink {
    fn send_line(&self, line: &str) -> io::Result<()> {
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Reply::Now(document(serde_json::json!({"response": "ok"}))));
        if matches!(reply, Reply::WriteFailure) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure"));
        }
        self.events
            .lock()
            .expect("events lock")
            .push(format!("sent {line}"));

        match reply {
            Reply::Now(response) => {
                record_reply(&self.events, &response);
                self.deliver(&response);
            }
            Reply::After(delay, response) => {
                let events = Arc::clone(&self.events);
                let feeder = Arc::clone(&self.feeder);
                thread::spawn(move || {
                    thread::sleep(delay);
                    record_reply(&events, &response);
                    if let Some(feeder) = feeder.get() {
                        feeder.on_response(&response);
                    }
                });
            }
            Reply::Silence | Reply::WriteFailure => {}
        }
        Ok(())
    }
}

fn record_reply(events: &Mutex<Vec<String>>, response: &Document) {
    events
        .lock()
        .expect("events lock")
        .push(format!("reply {}", Value::Object(response.clone())));
}

/// Notification listener that keeps everything it receives.
#[derive(Default)]
pub(crate) struct RecordingListener {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingListener {
    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().expect("listener lock").clone()
    }
}

impl NotificationListener for RecordingListener {
    fn on_notification(&self, notification: &Notification) {
        self.notifications
            .lock()
            .expect("listener lock")
            .push(notification.clone());
    }
}

/// What the test server does after reading a command.
pub(crate) enum ServerAction {
    /// Write these lines and keep reading.
    Send(Vec<String>),
    /// Write these lines and close the connection.
    SendAndClose(Vec<String>),
}

/// In-process phaser server accepting one connection.
pub(crate) struct TestServer {
    port: u16,
    commands: Arc<Mutex<Vec<Document>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl TestServer {
    /// Spawns a server that answers each command via `respond`.
    pub(crate) fn spawn<F>(respond: F) -> Result<Self>
    where
        F: Fn(&Document) -> ServerAction + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind test server")?;
        let port = listener.local_addr().context("local addr")?.port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&commands);
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept connection")?;
            serve(stream, &recorded, &respond)
        });
        Ok(Self {
            port,
            commands,
            handle: Some(handle),
        })
    }

    /// A server that reports `version` and `cavities` and accepts everything
    /// else.
    pub(crate) fn phaser(version: &'static str, cavities: &'static [&'static str]) -> Result<Self> {
        Self::spawn(move |command| {
            let reply = match command.get("command").and_then(Value::as_str) {
                Some("version") => serde_json::json!({"response": "ok", "version": version}),
                Some("cavities") => serde_json::json!({"response": "ok", "cavities": cavities}),
                _ => serde_json::json!({"response": "ok"}),
            };
            ServerAction::Send(vec![reply.to_string()])
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the connection to end and returns the commands received.
    pub(crate) fn finish(mut self) -> Result<Vec<Document>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("test server thread panicked"))??;
        }
        let commands = self
            .commands
            .lock()
            .map_err(|error| anyhow!("lock commands: {error}"))?;
        Ok(commands.clone())
    }
}

fn serve<F>(stream: TcpStream, commands: &Mutex<Vec<Document>>, respond: &F) -> Result<()>
where
    F: Fn(&Document) -> ServerAction,
{
    let mut writer = stream.try_clone().context("clone stream")?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) if error.kind() == io::ErrorKind::ConnectionReset => break,
            Err(error) => return Err(error).context("read command"),
        };
        let command = decode_line(&line).context("decode command")?;
        commands
            .lock()
            .map_err(|error| anyhow!("lock commands: {error}"))?
            .push(command.clone());
        let (lines, close) = match respond(&command) {
            ServerAction::Send(lines) => (lines, false),
            ServerAction::SendAndClose(lines) => (lines, true),
        };
        for reply in lines {
            writer.write_all(reply.as_bytes()).context("write reply")?;
            writer.write_all(b"\n").context("write newline")?;
        }
        writer.flush().context("flush replies")?;
        if close {
            let _ = writer.shutdown(std::net::Shutdown::Both);
            break;
        }
    }
    Ok(())
}
