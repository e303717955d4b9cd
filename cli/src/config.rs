// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Locating and reading the configuration file.

use std::{error::Error, path::PathBuf, str::FromStr};

use tokio::fs;

use calsync_core::{APP_NAME, Config as CoreConfig, get_config_dir};
use calsync_http::RemoteConfig;

const CONFIG_ENV: &str = "CALSYNC_CONFIG";

/// The contents of the configuration file.
#[derive(Debug, Default, serde::Deserialize)]
pub struct Settings {
    /// The `[core]` table.
    #[serde(default)]
    pub core: CoreConfig,

    /// The `[remote]` table, absent for offline use.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl FromStr for Settings {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Flag,
    Env,
    Default,
}

/// Reads the configuration from `flag`, then `$CALSYNC_CONFIG`, then the user config directory.
#[tracing::instrument]
pub async fn load_settings(flag: Option<PathBuf>) -> Result<Settings, Box<dyn Error>> {
    let (path, origin) = locate(flag)?;
    tracing::debug!(path = %path.display(), ?origin, "reading configuration");

    let text = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {e}", path.display()))?;
    let settings = text
        .parse::<Settings>()
        .map_err(|e| format!("Invalid config file {}: {e}", path.display()))?;
    Ok(settings)
}

fn locate(flag: Option<PathBuf>) -> Result<(PathBuf, Origin), Box<dyn Error>> {
    if let Some(path) = flag {
        return Ok((path, Origin::Flag));
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok((PathBuf::from(path), Origin::Env));
    }

    let path = get_config_dir()?.join(APP_NAME).join("config.toml");
    if !path.exists() {
        return Err(format!(
            "No config found at {}, pass --config or set {CONFIG_ENV}",
            path.display()
        )
        .into());
    }
    Ok((path, Origin::Default))
}
