//! Harness types for driving `phaserctl` in-process against a fake server.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result, anyhow, ensure};
use phaser_config::Config;
use serde_json::{Value, json};

use crate::{AppError, ConfigLoader, run_with_loader};

pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// How the fake server behaves for one connection.
#[derive(Debug, Clone)]
pub(super) struct Script {
    pub(super) version: String,
    pub(super) cavities: Vec<String>,
    /// Reply to every command other than `version` and `cavities`.
    pub(super) reply: Value,
    /// Notifications sent after the cavity list, after which the server
    /// closes the connection.
    pub(super) notifications: Vec<Value>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            version: String::from("Test-Server 0.2.0"),
            cavities: vec![String::from("0L03-1"), String::from("0L03-2")],
            reply: json!({"response": "ok"}),
            notifications: Vec::new(),
        }
    }
}

/// A phaser server that accepts one connection and follows a [`Script`].
pub(super) struct FakeServer {
    port: u16,
    commands: Arc<Mutex<Vec<Value>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl FakeServer {
    pub(super) fn spawn(script: Script) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake server")?;
        let port = listener.local_addr().context("local addr")?.port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&commands);
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept connection")?;
            serve(stream, &script, &recorded)
        });
        Ok(Self {
            port,
            commands,
            handle: Some(handle),
        })
    }

    pub(super) fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the connection to end and returns the commands received.
    pub(super) fn finish(mut self) -> Result<Vec<Value>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake server thread panicked"))??;
        }
        let commands = self
            .commands
            .lock()
            .map_err(|error| anyhow!("lock commands: {error}"))?;
        Ok(commands.clone())
    }
}

fn serve(stream: TcpStream, script: &Script, commands: &Mutex<Vec<Value>>) -> Result<()> {
    let mut writer = stream.try_clone().context("clone stream")?;
    for line in BufReader::new(stream).lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) if error.kind() == io::ErrorKind::ConnectionReset => break,
            Err(error) => return Err(error).context("read command"),
        };
        let command: Value = serde_json::from_str(&line).context("decode command")?;
        let name = command
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        commands
            .lock()
            .map_err(|error| anyhow!("lock commands: {error}"))?
            .push(command);

        let reply = match name.as_str() {
            "version" => json!({"response": "ok", "version": script.version}),
            "cavities" => json!({"response": "ok", "cavities": script.cavities}),
            _ => script.reply.clone(),
        };
        writeln!(writer, "{reply}").context("write reply")?;
        if name == "cavities" && !script.notifications.is_empty() {
            for notification in &script.notifications {
                writeln!(writer, "{notification}").context("write notification")?;
            }
            writer.flush().context("flush notifications")?;
            let _ = writer.shutdown(Shutdown::Both);
            break;
        }
        writer.flush().context("flush reply")?;
    }
    Ok(())
}

/// CLI invocation state shared by unit tests and BDD steps.
#[derive(Default)]
pub(super) struct TestWorld {
    pub(super) script: Script,
    pub(super) stdout: Vec<u8>,
    pub(super) stderr: Vec<u8>,
    pub(super) exit_code: Option<ExitCode>,
    pub(super) commands: Vec<Value>,
}

impl TestWorld {
    /// Starts a fake server for `script`, runs `command` against it and
    /// records the outcome.
    pub(super) fn run(&mut self, command: &str) -> Result<()> {
        let server = FakeServer::spawn(self.script.clone())?;
        let config = Config {
            server_host: String::from("127.0.0.1"),
            server_port: server.port(),
            response_timeout_secs: 2,
            ..Config::default()
        };
        self.run_with_config(command, config);
        self.commands = server.finish()?;
        Ok(())
    }

    /// Runs `command` against a port nothing listens on.
    pub(super) fn run_offline(&mut self, command: &str) -> Result<()> {
        let port = TcpListener::bind(("127.0.0.1", 0))
            .and_then(|listener| listener.local_addr())
            .context("reserve a closed port")?
            .port();
        let config = Config {
            server_host: String::from("127.0.0.1"),
            server_port: port,
            connect_timeout_secs: 1,
            ..Config::default()
        };
        self.run_with_config(command, config);
        Ok(())
    }

    fn run_with_config(&mut self, command: &str, config: Config) {
        self.stdout.clear();
        self.stderr.clear();
        let mut args = vec![OsString::from("phaserctl")];
        args.extend(command.split_whitespace().map(OsString::from));
        let loader = StaticConfigLoader::new(config);
        let exit = run_with_loader(args, &mut self.stdout, &mut self.stderr, &loader);
        self.exit_code = Some(exit);
    }

    pub(super) fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).context("stdout is not UTF-8")
    }

    pub(super) fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr is not UTF-8")
    }

    pub(super) fn assert_exit(&self, expected: ExitCode) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(exit == expected, "expected exit {expected:?}, got {exit:?}");
        Ok(())
    }

    pub(super) fn command_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| command.get("command").and_then(Value::as_str))
            .collect()
    }
}
