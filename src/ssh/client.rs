// ABOUTME: SSH session management using russh.
// ABOUTME: Handles connection, password or key authentication, command execution, and shells.

use super::error::{Error, Result};
use crate::config::Auth;
use russh::client::{self, AuthResult, Config, Handle, Msg};
use russh::keys::known_hosts::{check_known_hosts, check_known_hosts_path};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{Channel, ChannelMsg, Disconnect};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Terminal type and size requested for interactive shells.
const SHELL_TERM: &str = "vt100";
const SHELL_COLS: u32 = 80;
const SHELL_ROWS: u32 = 24;

/// Configuration for establishing an SSH session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Remote host to connect to.
    pub host: String,
    /// SSH port (default: 22).
    pub port: u16,
    /// Username for authentication.
    pub user: String,
    /// Password or private key.
    pub auth: Auth,
    /// Optional path to known_hosts file.
    /// If None, uses the default ~/.ssh/known_hosts.
    pub known_hosts_path: Option<PathBuf>,
    /// Timeout for establishing the TCP connection and handshake (default: 30 seconds).
    pub connect_timeout: Duration,
    /// Timeout for command execution (default: 30 seconds).
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, auth: Auth) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            auth,
            known_hosts_path: None,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(30),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandOutput {
    /// Exit status, if the server reported one.
    pub exit_status: Option<u32>,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }

    /// Stdout and stderr merged into one string.
    ///
    /// When stderr is non-empty the result is stdout, a newline, then stderr.
    /// Trailing whitespace is trimmed either way.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.trim_end().to_string()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
                .trim_end()
                .to_string()
        }
    }
}

/// SSH client handler for russh.
///
/// Trust-on-first-use: a key missing from known_hosts is accepted and
/// remembered for this session only. A key contradicting known_hosts is refused.
pub(crate) struct SshHandler {
    host: String,
    port: u16,
    known_hosts_path: Option<PathBuf>,
    accepted_key: Option<ssh_key::PublicKey>,
}

impl SshHandler {
    fn new(host: String, port: u16, known_hosts_path: Option<PathBuf>) -> Self {
        Self {
            host,
            port,
            known_hosts_path,
            accepted_key: None,
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        // Re-key within the same session must present the same key.
        if let Some(accepted) = &self.accepted_key {
            return Ok(accepted == server_public_key);
        }

        let check_result = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match check_result {
            Ok(true) => Ok(true),
            Err(russh::keys::Error::KeyChanged { line }) => {
                tracing::warn!(
                    "Host key for {}:{} differs from known_hosts line {}",
                    self.host,
                    self.port,
                    line
                );
                Ok(false)
            }
            other => {
                if let Err(e) = other {
                    tracing::debug!("known_hosts lookup failed: {}", e);
                }
                tracing::warn!(
                    "Trust-On-First-Use: accepting unknown host key for {}:{}",
                    self.host,
                    self.port
                );
                self.accepted_key = Some(server_public_key.clone());
                Ok(true)
            }
        }
    }
}

/// Authentication method resolved from config.
enum AuthMethod {
    Password(String),
    KeyFile(Arc<ssh_key::PrivateKey>),
}

/// An established SSH session.
///
/// Closed explicitly with [`close`](Session::close); dropping an open
/// session drops the russh handle, which ends the connection.
pub struct Session {
    config: SessionConfig,
    handle: Option<Handle<SshHandler>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("handle", &self.handle.as_ref().map(|_| "<russh::Handle>"))
            .finish()
    }
}

impl Session {
    /// Connect to the remote host and authenticate.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        // Load the key before touching the network so a bad path fails fast
        let auth_method = Self::resolve_auth_method(&config)?;

        let russh_config = Config {
            keepalive_interval: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let handler = SshHandler::new(
            config.host.clone(),
            config.port,
            config.known_hosts_path.clone(),
        );

        tracing::debug!("Connecting to {}:{}", config.host, config.port);
        let connecting = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            handler,
        );

        let mut handle = match tokio::time::timeout(config.connect_timeout, connecting).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(russh::Error::UnknownKey)) => {
                return Err(Error::HostKeyRejected {
                    host: config.host.clone(),
                    port: config.port,
                });
            }
            Ok(Err(russh::Error::IO(e))) => {
                return Err(Error::Connection(format!(
                    "{}:{}: {}",
                    config.host, config.port, e
                )));
            }
            Ok(Err(e)) => return Err(Error::Protocol(e)),
            Err(_) => {
                return Err(Error::ConnectTimeout {
                    host: config.host.clone(),
                    port: config.port,
                    timeout: config.connect_timeout,
                });
            }
        };

        let auth_result = Self::authenticate(&mut handle, &config, auth_method).await?;
        if !auth_result.success() {
            return Err(Error::AuthenticationFailed {
                user: config.user.clone(),
            });
        }

        tracing::debug!("Authenticated as {}", config.user);

        Ok(Self {
            config,
            handle: Some(handle),
        })
    }

    fn resolve_auth_method(config: &SessionConfig) -> Result<AuthMethod> {
        match &config.auth {
            Auth::KeyFile(path) => {
                let key = load_secret_key(path, None).map_err(|e| Error::KeyLoadFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                Ok(AuthMethod::KeyFile(Arc::new(key)))
            }
            Auth::Password(password) => Ok(AuthMethod::Password(password.clone())),
        }
    }

    async fn authenticate(
        handle: &mut Handle<SshHandler>,
        config: &SessionConfig,
        auth_method: AuthMethod,
    ) -> Result<AuthResult> {
        match auth_method {
            AuthMethod::Password(password) => handle
                .authenticate_password(config.user.as_str(), password)
                .await
                .map_err(Error::Protocol),
            AuthMethod::KeyFile(key) => {
                let hash_alg = handle
                    .best_supported_rsa_hash()
                    .await
                    .map_err(Error::Protocol)?
                    .flatten();

                handle
                    .authenticate_publickey(
                        config.user.as_str(),
                        PrivateKeyWithHashAlg::new(key, hash_alg),
                    )
                    .await
                    .map_err(Error::Protocol)
            }
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn handle(&self) -> Result<&Handle<SshHandler>> {
        self.handle.as_ref().ok_or(Error::SessionClosed)
    }

    /// Execute a command on the remote host.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.exec_with_timeout(command, self.config.command_timeout).await
    }

    /// Execute a command with a custom timeout.
    pub async fn exec_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        match tokio::time::timeout(timeout, self.exec_inner(command)).await {
            Ok(result) => result,
            Err(_) => Err(Error::CommandTimeout(timeout)),
        }
    }

    /// Execute a command and return stdout and stderr merged.
    ///
    /// See [`CommandOutput::combined`]. The exit status is not reported.
    pub async fn run_command(&self, command: &str, timeout: Duration) -> Result<String> {
        self.exec_with_timeout(command, timeout)
            .await
            .map(|output| output.combined())
    }

    async fn exec_inner(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle()?
            .channel_open_session()
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to exec command: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        // stderr
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status: status }) => {
                    exit_status = Some(status);
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if exit_status.is_some() {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        // Neither EOF nor an exit status: the connection dropped mid-command
        if !got_eof && exit_status.is_none() {
            return Err(Error::ChannelClosed);
        }

        Ok(CommandOutput {
            exit_status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Open a channel with a PTY and a login shell on it.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let channel = self
            .handle()?
            .channel_open_session()
            .await
            .map_err(|e| Error::ShellFailed(format!("failed to open channel: {}", e)))?;

        channel
            .request_pty(true, SHELL_TERM, SHELL_COLS, SHELL_ROWS, 0, 0, &[])
            .await
            .map_err(|e| Error::ShellFailed(format!("PTY request failed: {}", e)))?;

        channel
            .request_shell(true)
            .await
            .map_err(|e| Error::ShellFailed(format!("shell request failed: {}", e)))?;

        tracing::debug!("Shell channel {:?} opened", channel.id());
        Ok(channel)
    }

    /// Disconnect the session. Calling this on a closed session does nothing.
    pub async fn close(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)?;
        tracing::debug!("Disconnected from {}", self.config.host);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.handle.is_some() {
            tracing::debug!(
                "Session to {} dropped without close; dropping handle",
                self.config.host
            );
        }
    }
}
