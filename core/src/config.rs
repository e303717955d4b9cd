// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de;

use crate::SyncError;

/// The name of the application, used for state and config directories.
pub const APP_NAME: &str = "calsync";

const DB_FILENAME: &str = "calsync.db";

/// Configuration of the sync engine.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// Directory for storing the queue, the cursors and the local entities.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Upload queue tuning.
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    /// Normalize the configuration.
    pub fn normalize(&mut self) -> Result<(), SyncError> {
        match &self.state_dir {
            Some(a) => {
                let dir = expand_path(a).map_err(|e| {
                    SyncError::Config(format!("Failed to expand state directory path: {e}"))
                })?;
                self.state_dir = Some(dir);
            }

            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!(err = %e, "failed to get state directory"),
            },
        };

        if self.upload.backoff_initial.0 > self.upload.backoff_max.0 {
            return Err(SyncError::Config(
                "upload.backoff_initial must not exceed upload.backoff_max".into(),
            ));
        }

        Ok(())
    }

    /// The SQLite file under the state directory, `None` for an in-memory database.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.state_dir.as_ref().map(|dir| dir.join(DB_FILENAME))
    }
}

/// Upload queue tuning.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Failed attempts after which a task is dead-lettered, 0 retries forever.
    pub max_failures: u32,

    /// Delay before the first retry.
    pub backoff_initial: ConfigDuration,

    /// Upper bound of the retry delay.
    pub backoff_max: ConfigDuration,

    /// Write the server's copy back to the local store after a push.
    pub mirror_remote: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_failures: 10,
            backoff_initial: ConfigDuration(Duration::from_secs(1)),
            backoff_max: ConfigDuration(Duration::from_secs(5 * 60)),
            mirror_remote: true,
        }
    }
}

/// A duration read from a string like `"HH:MM"`, `"1d"`, `"24h"`, `"60m"` or `"1800s"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDuration(pub Duration);

impl<'de> serde::Deserialize<'de> for ConfigDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> de::Visitor<'de> for DurationVisitor {
            type Value = ConfigDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter
                    .write_str(r#"a duration string like "HH:MM", "1d", "24h", "60m", or "1800s""#)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                parse_duration(value)
                    .map(ConfigDuration)
                    .map_err(E::custom)
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

/// Handle tilde (~) and environment variables in the path
pub fn expand_path(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, String> {
    dirs::home_dir().ok_or_else(|| "User-specific home directory not found".into())
}

/// The user's configuration directory.
pub fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, String> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir.ok_or_else(|| "User-specific state directory not found".into())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let number = |v: &str| -> Result<u64, String> {
        v.trim()
            .parse()
            .map_err(|e| format!("Invalid duration {s:?}: {e}"))
    };

    if let Some((h, m)) = s.split_once(':') {
        Ok(Duration::from_secs((number(h)? * 60 + number(m)?) * 60))
    } else if let Some(rest) = s.strip_suffix('d') {
        Ok(Duration::from_secs(number(rest)? * 24 * 60 * 60))
    } else if let Some(rest) = s.strip_suffix('h') {
        Ok(Duration::from_secs(number(rest)? * 60 * 60))
    } else if let Some(rest) = s.strip_suffix('m') {
        Ok(Duration::from_secs(number(rest)? * 60))
    } else if let Some(rest) = s.strip_suffix('s') {
        Ok(Duration::from_secs(number(rest)?))
    } else {
        Err(format!("Invalid duration format: {s}"))
    }
}
