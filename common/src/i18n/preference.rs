//! Persistence of the user's language choice.
//!
//! The resolver reads one key at start-up and writes it on every language
//! change. Stores are injected so tests can run against memory.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use log::warn;

use super::{BaseDirs, PreferenceError};

const TARGET: &str = "i18n::preference";
const PREFERENCES_FILENAME: &str = "preferences.toml";

/// Durable per-user key/value storage.
pub trait PreferenceStore: fmt::Debug + Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`PreferenceError`] when the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `key = value`.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store backed by a TOML file of string keys and values.
///
/// A missing file reads as empty. A file that does not parse also reads as
/// empty, and the next write replaces it.
#[derive(Debug)]
pub struct FileStore {
    path: Utf8PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Use the preference file at `path`.
    #[must_use]
    pub fn at(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Use `preferences.toml` inside the per-user configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::MissingConfigDirectory`] when `dirs` cannot
    /// name a configuration directory.
    pub fn in_config_dir(dirs: &dyn BaseDirs) -> Result<Self, PreferenceError> {
        let config_dir = dirs
            .manzil_config_dir()
            .ok_or(PreferenceError::MissingConfigDirectory)?;
        Ok(Self::at(config_dir.join(PREFERENCES_FILENAME)))
    }

    /// Location of the preference file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(values) => Ok(values),
            Err(error) => {
                warn!(
                    target: TARGET,
                    "ignoring unreadable preference file {}: {error}",
                    self.path,
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut values) => values.remove(key),
            Err(error) => {
                warn!(target: TARGET, "{error}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        let content =
            toml::to_string(&values).map_err(|source| PreferenceError::Serialize { source })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, content).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
