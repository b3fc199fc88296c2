//! Session token storage
//!
//! The token lives in a small JSON file, by default
//! `<config dir>/parttime-comms/session.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ClientResult;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Session file under the platform config directory
    pub fn default_location() -> Self {
        let mut path = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        path.push("parttime-comms");
        path.push("session.json");
        Self { path }
    }

    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::at(path),
            None => Self::default_location(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token; a missing file means no session
    pub fn load(&self) -> ClientResult<Option<String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: SessionFile = serde_json::from_str(&text)?;
        Ok(session.token.filter(|t| !t.trim().is_empty()))
    }

    pub fn save(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let session = SessionFile {
            token: Some(token.to_string()),
        };
        std::fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
