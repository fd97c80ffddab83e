// ABOUTME: In-process SSH server for integration tests.
// ABOUTME: Runs scripted exec commands and an echoing shell on a background thread.

use russh::keys::ssh_key::LineEnding;
use russh::keys::ssh_key::private::Ed25519Keypair;
use russh::keys::{PrivateKey, PublicKey};
use russh::server::{self, Auth, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec};
use ssh_connect::config::Auth as Credentials;
use ssh_connect::ssh::SessionConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const USER: &str = "tester";
pub const PASSWORD: &str = "secret";

/// Shell prompt sent when the shell starts and after each echoed line.
pub const PROMPT: &str = "$ ";

/// Exec commands with scripted results. Anything else is echoed back.
///
/// - `both`: writes `out` to stdout and `err\n` to stderr, exits 0
/// - `fail`: writes `partial\n` to stdout, exits 3
/// - `hang`: accepts the request and never answers
pub const BOTH_STREAMS: &str = "both";
pub const FAILING: &str = "fail";
pub const HANGING: &str = "hang";

/// Shell input that makes the server close the channel.
pub const LOGOUT: &str = "logout\n";

/// An SSH server on 127.0.0.1 serving every connection until the test process exits.
pub struct TestServer {
    port: u16,
    host_key: PrivateKey,
    client_key: PrivateKey,
}

impl TestServer {
    pub fn start() -> Self {
        let host_key = fixed_key(1);
        let client_key = fixed_key(2);

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let port = listener.local_addr().expect("listener address").port();
        listener.set_nonblocking(true).expect("non-blocking listener");

        let config = Arc::new(server::Config {
            keys: vec![host_key.clone()],
            auth_rejection_time: Duration::from_millis(10),
            auth_rejection_time_initial: Some(Duration::ZERO),
            inactivity_timeout: None,
            ..Default::default()
        });
        let authorized = client_key.public_key().clone();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("test server runtime");
            runtime.block_on(serve(listener, config, authorized));
        });

        Self {
            port,
            host_key,
            client_key,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Session settings for this server, checking host keys against `known_hosts`.
    pub fn session_config(&self, auth: Credentials, known_hosts: &Path) -> SessionConfig {
        SessionConfig::new("127.0.0.1", USER, auth)
            .port(self.port)
            .known_hosts_path(known_hosts)
            .connect_timeout(Duration::from_secs(5))
    }

    pub fn password_config(&self, known_hosts: &Path) -> SessionConfig {
        self.session_config(Credentials::Password(PASSWORD.to_string()), known_hosts)
    }

    /// Write the authorized client key into `dir` in OpenSSH format.
    pub fn write_client_key(&self, dir: &Path) -> PathBuf {
        let path = dir.join("id_ed25519");
        let pem = self
            .client_key
            .to_openssh(LineEnding::LF)
            .expect("encode client key");
        std::fs::write(&path, pem.as_bytes()).expect("write client key");
        path
    }

    /// A known_hosts line recording `key` for this server's address.
    pub fn known_hosts_line(&self, key: &PublicKey) -> String {
        let encoded = key.to_openssh().expect("encode public key");
        format!("[127.0.0.1]:{} {}\n", self.port, encoded)
    }

    pub fn host_public_key(&self) -> &PublicKey {
        self.host_key.public_key()
    }
}

/// Deterministic Ed25519 key derived from `seed`.
pub fn fixed_key(seed: u8) -> PrivateKey {
    PrivateKey::from(Ed25519Keypair::from_seed(&[seed; 32]))
}

async fn serve(
    listener: std::net::TcpListener,
    config: Arc<server::Config>,
    authorized: PublicKey,
) {
    let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
        return;
    };
    while let Ok((stream, _)) = listener.accept().await {
        let handler = ScriptedHost {
            authorized: authorized.clone(),
        };
        let config = config.clone();
        tokio::spawn(async move {
            if let Ok(session) = server::run_stream(config, stream, handler).await {
                let _ = session.await;
            }
        });
    }
}

struct ScriptedHost {
    authorized: PublicKey,
}

impl ScriptedHost {
    fn finish(
        session: &mut Session,
        channel: ChannelId,
        exit_status: u32,
    ) -> Result<(), russh::Error> {
        session.exit_status_request(channel, exit_status)?;
        session.eof(channel)?;
        session.close(channel)
    }
}

impl server::Handler for ScriptedHost {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if user == USER && password == PASSWORD {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::reject())
        }
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        if user == USER && *public_key == self.authorized {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::reject())
        }
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)?;

        let command = String::from_utf8_lossy(data).into_owned();
        match command.as_str() {
            BOTH_STREAMS => {
                session.data(channel, CryptoVec::from("out"))?;
                session.extended_data(channel, 1, CryptoVec::from("err\n"))?;
                Self::finish(session, channel, 0)
            }
            FAILING => {
                session.data(channel, CryptoVec::from("partial\n"))?;
                Self::finish(session, channel, 3)
            }
            HANGING => Ok(()),
            _ => {
                session.data(channel, CryptoVec::from(format!("{command}\n")))?;
                Self::finish(session, channel, 0)
            }
        }
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)?;
        session.data(channel, CryptoVec::from(PROMPT))
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        if data == LOGOUT.as_bytes() {
            session.eof(channel)?;
            return session.close(channel);
        }
        session.data(channel, CryptoVec::from_slice(data))?;
        session.data(channel, CryptoVec::from(PROMPT))
    }
}
