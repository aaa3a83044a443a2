//! Scripted in-memory implementations of the transport traits

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sshdeck_core::{
    ChunkSource, RemoteOutput, RemoteSession, SessionError, SessionResult, ShellChannel,
};

/// Everything the scripted remote observed
#[derive(Debug, Default)]
pub struct Wire {
    pub sent: Vec<String>,
    pub commands: Vec<String>,
    pub shells_opened: usize,
    pub shells_closed: usize,
    pub session_closes: usize,
}

pub type SharedWire = Arc<Mutex<Wire>>;

/// Shell that echoes each received line as `line\r\n`, then queues the next
/// scripted reply
pub struct ScriptedShell {
    ready: VecDeque<Vec<u8>>,
    replies: VecDeque<String>,
    echo: bool,
    wire: SharedWire,
}

impl ChunkSource for ScriptedShell {
    fn poll_chunk(&mut self, max_len: usize) -> Option<Vec<u8>> {
        self.ready.poll_chunk(max_len)
    }
}

#[async_trait]
impl ShellChannel for ScriptedShell {
    async fn send(&mut self, data: &[u8]) -> SessionResult<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        self.wire.lock().unwrap().sent.push(text.clone());
        if self.echo {
            let echoed = format!("{}\r\n", text.trim_end_matches('\n'));
            self.ready.push_back(echoed.into_bytes());
        }
        if let Some(reply) = self.replies.pop_front() {
            self.ready.push_back(reply.into_bytes());
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.wire.lock().unwrap().shells_closed += 1;
    }
}

/// Session whose behaviour is fixed up front
pub struct ScriptedSession {
    host: String,
    banner: String,
    replies: Vec<String>,
    echo: bool,
    command_output: RemoteOutput,
    command_failure: Option<String>,
    wire: SharedWire,
}

impl ScriptedSession {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            banner: String::new(),
            replies: Vec::new(),
            echo: true,
            command_output: RemoteOutput::default(),
            command_failure: None,
            wire: SharedWire::default(),
        }
    }

    pub fn with_banner(mut self, banner: &str) -> Self {
        self.banner = banner.to_string();
        self
    }

    pub fn with_replies(mut self, replies: &[&str]) -> Self {
        self.replies = replies.iter().map(ToString::to_string).collect();
        self
    }

    pub const fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn with_command_output(mut self, stdout: &str, stderr: &str, status: Option<u32>) -> Self {
        self.command_output = RemoteOutput {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            exit_status: status,
        };
        self
    }

    pub fn failing_commands(mut self, reason: &str) -> Self {
        self.command_failure = Some(reason.to_string());
        self
    }

    pub fn wire(&self) -> SharedWire {
        Arc::clone(&self.wire)
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    type Shell = ScriptedShell;

    fn host(&self) -> &str {
        &self.host
    }

    async fn open_shell(&mut self) -> SessionResult<ScriptedShell> {
        self.wire.lock().unwrap().shells_opened += 1;
        let mut ready = VecDeque::new();
        if !self.banner.is_empty() {
            ready.push_back(self.banner.clone().into_bytes());
        }
        Ok(ScriptedShell {
            ready,
            replies: self.replies.iter().cloned().collect(),
            echo: self.echo,
            wire: Arc::clone(&self.wire),
        })
    }

    async fn run_command(&mut self, command: &str) -> SessionResult<RemoteOutput> {
        self.wire.lock().unwrap().commands.push(command.to_string());
        match &self.command_failure {
            Some(reason) => Err(SessionError::Protocol(reason.clone())),
            None => Ok(self.command_output.clone()),
        }
    }

    async fn close(&mut self) {
        self.wire.lock().unwrap().session_closes += 1;
    }
}
