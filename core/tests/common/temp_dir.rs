// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Temporary state directory management for integration tests.

use std::path::PathBuf;

use tokio::fs;

/// A temporary state directory, removed when dropped.
#[derive(Debug)]
pub struct TempState {
    /// State directory for database files.
    pub state_dir: PathBuf,
}

impl TempState {
    /// Creates a new temporary state directory.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let base = tempfile::tempdir()?.keep();
        let state_dir = base.join("state");
        fs::create_dir_all(&state_dir).await?;
        Ok(Self { state_dir })
    }

    /// The database file inside the state directory.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join("calsync.db")
    }

    fn base(&self) -> PathBuf {
        self.state_dir
            .parent()
            .expect("temp directories should have a parent")
            .to_path_buf()
    }
}

/// Sets up a temporary state directory for integration tests.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub async fn setup_temp_state() -> Result<TempState, Box<dyn std::error::Error>> {
    TempState::new().await
}

impl Drop for TempState {
    fn drop(&mut self) {
        let base = self.base();
        if let Err(e) = std::fs::remove_dir_all(&base) {
            tracing::warn!(path = %base.display(), err = %e, "failed to clean up temp directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temp_state_cleanup_on_drop() {
        let base = {
            let state = TempState::new().await.unwrap();
            assert!(state.state_dir.exists());
            state.base()
        };

        assert!(!base.exists());
    }
}
