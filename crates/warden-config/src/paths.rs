//! Derives runtime artefact paths shared by the daemon and the registrar.
//!
//! The state directory houses the service registry database plus the pid and
//! status-snapshot files written by a running service. Both binaries need to
//! agree on the layout so `remove` can find the artefacts written by `run`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "WARDEN_STATE_DIR";

const REGISTRY_FILE: &str = "warden-registry.json";

/// Canonical paths for runtime artefacts written by warden binaries.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    state_dir: PathBuf,
    registry_path: PathBuf,
}

impl RuntimePaths {
    /// Resolves and prepares the state directory.
    ///
    /// Resolution order: [`STATE_DIR_ENV`], then the platform state
    /// directory, then a `warden` directory under the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimePathsError`] when the directory cannot be created.
    pub fn resolve() -> Result<Self, RuntimePathsError> {
        let state_dir = env::var_os(STATE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_state_directory);
        Self::at(state_dir)
    }

    /// Builds paths rooted at an explicit directory, creating it on demand.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimePathsError`] when the directory cannot be created.
    pub fn at(state_dir: PathBuf) -> Result<Self, RuntimePathsError> {
        fs::create_dir_all(&state_dir).map_err(|source| RuntimePathsError::StateDirectory {
            path: state_dir.clone(),
            source,
        })?;
        Ok(Self {
            registry_path: state_dir.join(REGISTRY_FILE),
            state_dir,
        })
    }

    /// Directory holding runtime artefacts.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        self.state_dir.as_path()
    }

    /// Path to the service registry database.
    #[must_use]
    pub fn registry_path(&self) -> &Path {
        self.registry_path.as_path()
    }

    /// Path to the pid file of the named service.
    #[must_use]
    pub fn pid_path(&self, service: &str) -> PathBuf {
        self.state_dir.join(format!("{service}.pid"))
    }

    /// Path to the status snapshot of the named service.
    #[must_use]
    pub fn status_path(&self, service: &str) -> PathBuf {
        self.state_dir.join(format!("{service}.status"))
    }
}

fn default_state_directory() -> PathBuf {
    if let Some(mut dir) = dirs::state_dir() {
        dir.push("warden");
        return dir;
    }
    let mut dir = env::temp_dir();
    dir.push("warden");
    dir
}

/// Errors raised while deriving runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// Creating the state directory failed.
    #[error("failed to prepare state directory '{path}': {source}")]
    StateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_artefact_paths_under_the_state_dir() {
        let root = tempfile::tempdir().expect("temp dir should create");
        let paths = RuntimePaths::at(root.path().join("state")).expect("paths should derive");
        assert!(paths.state_dir().is_dir());
        assert!(paths.registry_path().ends_with(REGISTRY_FILE));
        assert_eq!(
            paths.pid_path("demo"),
            paths.state_dir().join("demo.pid")
        );
        assert_eq!(
            paths.status_path("demo"),
            paths.state_dir().join("demo.status")
        );
    }
}
