// ABOUTME: Settings file (.env) discovery and KEY=VALUE parsing.
// ABOUTME: Walks from a directory up through its ancestors to find the nearest .env.

use super::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::Path;

pub const SETTINGS_FILENAME: &str = ".env";

/// A loaded settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsFile {
    entries: HashMap<String, String>,
}

impl SettingsFile {
    /// Load exactly the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Find the nearest `.env` in `dir` or any of its ancestors.
    ///
    /// Finding nothing is not an error.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        for candidate in dir.ancestors().map(|d| d.join(SETTINGS_FILENAME)) {
            if candidate.is_file() {
                tracing::debug!("Using settings file {}", candidate.display());
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// Parse `KEY=VALUE` lines. Malformed lines are skipped with a warning.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Ok((key, value)) => {
                    entries.insert(key, value);
                }
                Err(reason) => {
                    tracing::warn!("Skipping settings line {}: {}", idx + 1, reason);
                }
            }
        }

        Self { entries }
    }

    /// Non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn parse_line(line: &str) -> std::result::Result<(String, String), &'static str> {
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, rest) = line.split_once('=').ok_or("missing '='")?;

    let key = key.trim();
    if key.is_empty() {
        return Err("empty key");
    }

    let rest = rest.trim_start();
    let value = match rest.chars().next() {
        Some('"') => parse_double_quoted(&rest[1..])?,
        Some('\'') => {
            let end = rest[1..].find('\'').ok_or("unterminated quote")?;
            rest[1..=end].to_string()
        }
        _ => strip_inline_comment(rest).trim_end().to_string(),
    };

    Ok((key.to_string(), value))
}

fn parse_double_quoted(s: &str) -> std::result::Result<String, &'static str> {
    let mut value = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(other @ ('"' | '\\')) => value.push(other),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            _ => value.push(c),
        }
    }

    Err("unterminated quote")
}

/// `#` only starts a comment when preceded by whitespace.
fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return &value[..i];
        }
    }
    value
}
