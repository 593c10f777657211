use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const NOTE_FILE: &str = "note.txt";

/// On-device copy of the plain-text note, read at startup and rewritten on
/// every edit.
#[derive(Debug, Clone)]
pub struct NoteStore {
    path: PathBuf,
}

/// Where the note lives unless overridden.
pub fn default_store_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("LOCALAPPDATA") {
            return PathBuf::from(appdata).join("notemirror").join(NOTE_FILE);
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("notemirror")
                .join(NOTE_FILE);
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("notemirror").join(NOTE_FILE);
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("notemirror")
                .join(NOTE_FILE);
        }
    }

    PathBuf::from(".notemirror-note.txt")
}

impl NoteStore {
    /// Open the store, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create note dir {}", parent.display()))?;
        }
        tracing::debug!(path = %path.display(), "persistent note storage granted");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored note, or `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to read note {}", self.path.display()))
    }

    /// Overwrite the stored note.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, text: &str) -> Result<()> {
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write note {}", self.path.display()))
    }
}
