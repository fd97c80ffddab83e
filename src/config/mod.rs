// ABOUTME: Connection configuration resolved from layered sources.
// ABOUTME: Explicit overrides win over the settings file, which wins over the environment.

mod error;
mod settings_file;

pub use error::{ConfigError, Result};
pub use settings_file::{SETTINGS_FILENAME, SettingsFile};

use crate::ssh::SessionConfig;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 22;

/// Setting names, shared by the settings file and the process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Host,
    User,
    Password,
    KeyPath,
    Port,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::Host,
        SettingKey::User,
        SettingKey::Password,
        SettingKey::KeyPath,
        SettingKey::Port,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Host => "SSH_HOST",
            SettingKey::User => "SSH_USER",
            SettingKey::Password => "SSH_PASSWORD",
            SettingKey::KeyPath => "SSH_KEY_PATH",
            SettingKey::Port => "SSH_PORT",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values supplied directly by the caller. Highest priority.
#[derive(Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub key_path: Option<PathBuf>,
    pub port: Option<u16>,
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_path", &self.key_path)
            .field("port", &self.port)
            .finish()
    }
}

/// How the session authenticates. A key file takes priority over a password.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Password(String),
    KeyFile(PathBuf),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Password(_) => f.write_str("Password(<redacted>)"),
            Auth::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
        }
    }
}

/// Fully resolved connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub auth: Auth,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Override,
    SettingsFile,
    Environment,
}

impl ConnectionConfig {
    /// Resolve from overrides, a settings file and the process environment.
    ///
    /// With no explicit `env_file`, the nearest `.env` at or above the
    /// current directory is used.
    pub fn resolve(overrides: &Overrides, env_file: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::resolve_from(overrides, env_file, &cwd)
    }

    /// Like [`resolve`](Self::resolve), searching for `.env` from `search_dir`.
    pub fn resolve_from(
        overrides: &Overrides,
        env_file: Option<&Path>,
        search_dir: &Path,
    ) -> Result<Self> {
        let settings = match env_file {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::discover(search_dir)?.unwrap_or_default(),
        };
        Self::from_layers(overrides, &settings)
    }

    /// Combine overrides and an already-loaded settings file with the environment.
    pub fn from_layers(overrides: &Overrides, settings: &SettingsFile) -> Result<Self> {
        let layered = |key: SettingKey, explicit: Option<String>| pick(key, explicit, settings);

        let host = layered(SettingKey::Host, overrides.host.clone());
        let user = layered(SettingKey::User, overrides.user.clone());
        let password = layered(SettingKey::Password, overrides.password.clone());
        let key_path = match overrides.key_path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => {
                tracing::debug!("{} resolved from {:?}", SettingKey::KeyPath, Source::Override);
                Some(expand_key_path(path))
            }
            _ => layered(SettingKey::KeyPath, None).map(|path| expand_home(&path)),
        };
        let port = match overrides.port {
            Some(port) => Some(port.to_string()),
            None => layered(SettingKey::Port, None),
        };

        let host = host.ok_or(ConfigError::MissingHost)?;
        let user = user.ok_or(ConfigError::MissingUser)?;
        let auth = match (key_path, password) {
            (Some(path), _) => Auth::KeyFile(path),
            (None, Some(password)) => Auth::Password(password),
            (None, None) => return Err(ConfigError::MissingCredentials),
        };
        let port = match port {
            Some(value) => parse_port(&value)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            user,
            port,
            auth,
        })
    }

    /// SSH session settings for this connection.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.host, &self.user, self.auth.clone()).port(self.port)
    }
}

fn pick(key: SettingKey, explicit: Option<String>, settings: &SettingsFile) -> Option<String> {
    let (value, source) = if let Some(v) = explicit.filter(|v| !v.is_empty()) {
        (v, Source::Override)
    } else if let Some(v) = settings.get(key.as_str()) {
        (v.to_string(), Source::SettingsFile)
    } else {
        let v = std::env::var(key.as_str()).ok().filter(|v| !v.is_empty())?;
        (v, Source::Environment)
    };
    tracing::debug!("{} resolved from {:?}", key, source);
    Some(value)
}

/// Parse a port number, rejecting 0 and anything that is not a `u16`.
pub fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            value: value.to_string(),
        }),
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Like [`expand_home`], leaving paths that are not valid UTF-8 untouched.
fn expand_key_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => expand_home(text),
        None => path.to_path_buf(),
    }
}
