//! Command execution bridge.
//!
//! # Responsibilities
//! - Spawn a route's entrypoint with its command text as the last argument
//! - Expose the request handler to the command while it runs
//! - Forward the command's stdout/stderr to the log
//! - Report spawn failures and abnormal exits
//! - Kill the command's whole process group on timeout or cancellation
//!
//! ## NOT Responsible For
//! - Route selection (see: dispatcher.rs)
//! - Serving request/response resources (see: crate::data)

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::dispatch::handler::{Handler, HandlerRegistry};
use crate::routing::RouteId;

/// Environment variable carrying the handler id.
pub const HANDLER_ID_ENV: &str = "CMDROUTER_HANDLER_ID";
/// Environment variable carrying the data API base URL.
pub const DATA_URL_ENV: &str = "CMDROUTER_DATA_URL";
/// Environment variable carrying the control API base URL.
pub const CONTROL_URL_ENV: &str = "CMDROUTER_CONTROL_URL";

/// Errors raised while running a command.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("entrypoint is empty")]
    EmptyEntrypoint,

    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),

    #[error("command exited abnormally: {0}")]
    Exit(ExitStatus),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),
}

/// One command run requested by the dispatcher.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub route_id: RouteId,
    pub entrypoint: String,
    pub command: String,
    pub handler: Arc<Handler>,
}

/// Runs a route's command against a live handler.
#[async_trait]
pub trait ExecutionBridge: Send + Sync {
    /// Run to completion. The handler's response holds whatever the command wrote.
    async fn execute(&self, invocation: Invocation) -> Result<(), BridgeError>;
}

/// Bridge that runs commands as child processes.
#[derive(Debug, Clone)]
pub struct CommandBridge {
    registry: Arc<HandlerRegistry>,
    data_url: String,
    control_url: String,
    timeout: Option<Duration>,
}

impl CommandBridge {
    pub fn new(registry: Arc<HandlerRegistry>, data_url: String, control_url: String) -> Self {
        Self {
            registry,
            data_url,
            control_url,
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_command(&self, invocation: &Invocation) -> Result<Command, BridgeError> {
        let mut words = invocation.entrypoint.split_whitespace();
        let program = words.next().ok_or(BridgeError::EmptyEntrypoint)?;

        let mut command = Command::new(program);
        command.args(words);
        if !invocation.command.is_empty() {
            command.arg(&invocation.command);
        }

        command
            .env(HANDLER_ID_ENV, invocation.handler.id())
            .env(DATA_URL_ENV, &self.data_url)
            .env(CONTROL_URL_ENV, &self.control_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Client went away: do not leave the command running
            .kill_on_drop(true);

        // Own group, so anything the entrypoint forks can be signalled with it
        #[cfg(unix)]
        command.process_group(0);

        Ok(command)
    }
}

#[async_trait]
impl ExecutionBridge for CommandBridge {
    async fn execute(&self, invocation: Invocation) -> Result<(), BridgeError> {
        let _registration = self.registry.register(invocation.handler.clone());
        let handler_id = invocation.handler.id().to_string();

        let mut child = self
            .build_command(&invocation)?
            .spawn()
            .map_err(BridgeError::Spawn)?;
        let mut group = ProcessGroup::new(child.id());

        tracing::debug!(
            handler_id = %handler_id,
            route_id = %invocation.route_id,
            pid = ?child.id(),
            "Command spawned"
        );

        // Drain pipes concurrently so a chatty command never blocks on a full pipe
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, handler_id.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, handler_id.clone(), "stderr"));
        }

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(result) => result.map_err(BridgeError::Wait)?,
                Err(_) => {
                    group.kill();
                    let _ = child.kill().await;
                    return Err(BridgeError::Timeout(limit));
                }
            },
            None => child.wait().await.map_err(BridgeError::Wait)?,
        };
        // A clean exit leaves the command's background jobs alone
        group.disarm();

        tracing::debug!(handler_id = %handler_id, status = %status, "Command finished");

        if status.success() {
            Ok(())
        } else {
            Err(BridgeError::Exit(status))
        }
    }
}

/// Process group of a running command, killed on drop unless disarmed.
///
/// Dropping the `execute` future (client disconnect) kills the group too.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self { pgid: leader }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // A negative pid addresses every member of the group. The leader is not
    // reaped yet, so the id cannot have been reused.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "Process group already gone"
        );
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

async fn forward_output<R>(reader: R, handler_id: String, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::info!(handler_id = %handler_id, stream, "{}", line);
    }
}
