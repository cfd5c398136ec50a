//! Small JSON files kept in the config directory.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};

use crate::error::{ClubSchedError, ClubSchedResult};

#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    owner_only: bool,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFile {
            path: path.into(),
            owner_only: false,
        }
    }

    /// A file only the current user may read, for secrets such as tokens.
    pub fn owner_only(path: impl Into<PathBuf>) -> Self {
        JsonFile {
            path: path.into(),
            owner_only: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is `None`, not an error.
    pub fn read<T: DeserializeOwned>(&self) -> ClubSchedResult<Option<T>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            ClubSchedError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    /// Write through a temp file so a crash never leaves half a file behind.
    pub fn write<T: Serialize>(&self, value: &T) -> ClubSchedResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(value)
            .map_err(|e| ClubSchedError::Serialization(e.to_string()))?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, content)?;

        // Restrict before the rename so the secret is never visible at its final path.
        #[cfg(unix)]
        if self.owner_only {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Delete the file. Returns false if there was nothing to delete.
    pub fn remove(&self) -> ClubSchedResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
