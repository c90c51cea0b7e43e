use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use snafu::{ResultExt, Snafu};

use crate::persist::{AtomicWriteError, write_json_atomically};

pub const PREFERENCES_DIRECTORY_NAME: &str = "chatpane";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Process-wide key/value side channel for small UI preferences.
///
/// Writes are best effort: callers log failures and carry on.
pub trait PreferenceStore {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    entries: RefCell<HashMap<String, String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file of string pairs, cached in memory and rewritten atomically.
pub struct FilePreferences {
    entries: ArcSwap<HashMap<String, String>>,
    path: PathBuf,
}

impl FilePreferences {
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|path| path.join(PREFERENCES_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".chatpane"))
            .join(PREFERENCES_FILE_NAME)
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from_disk(&path);
        Self {
            entries: ArcSwap::from_pointee(entries),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> HashMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("preferences file not found at {:?}", path);
                return HashMap::new();
            }
            Err(error) => {
                tracing::warn!("failed to read preferences from {:?}: {}", path, error);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(
                    "failed to parse preferences from {:?}: {}. starting empty",
                    path,
                    error
                );
                HashMap::new()
            }
        }
    }
}

impl PreferenceStore for FilePreferences {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.load().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut entries = HashMap::clone(&self.entries.load());
        entries.insert(key.to_string(), value.to_string());
        // Disk first so the cache never claims a value that was not written.
        write_json_atomically(&self.path, &entries).context(PersistSnafu {
            stage: "store-preference",
            key,
        })?;
        self.entries.store(Arc::new(entries));
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PreferenceError {
    #[snafu(display("failed to persist preference `{key}` on `{stage}`: {source}"))]
    Persist {
        stage: &'static str,
        key: String,
        source: AtomicWriteError,
    },
}
