//! Workspace configuration for the locale resolver.
//!
//! Deployments keep resolver settings in `manzil.toml`. Every field is
//! optional: without a file the resolver uses the embedded bundles, English
//! as the primary language, and `preferences.toml` in the per-user
//! configuration directory.
//!
//! ```toml
//! default_language = "hi"
//! locales_dir = "/srv/manzil/locales"
//! preference_file = "/var/lib/manzil/preferences.toml"
//! ```

use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use common::i18n::{
    BaseDirs, DirectorySource, FileStore, Language, LocaleRegistry, LocaleResolver, MemoryStore,
    PreferenceStore, RegistryError, SystemBaseDirs, UnknownLanguage,
};
use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

/// Conventional configuration file name.
pub const CONFIG_FILE: &str = "manzil.toml";

const TARGET: &str = "manzil::config";

/// Errors raised while loading configuration or wiring a resolver from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has unknown fields.
    #[error("invalid configuration: {source}")]
    Parse {
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// `default_language` does not name a known language.
    #[error("invalid default_language: {0}")]
    UnknownLanguage(#[from] UnknownLanguage),

    /// The configured language could not be made primary.
    #[error("invalid default_language: {0}")]
    Registry(#[from] RegistryError),
}

/// Resolver settings for a deployment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ManzilConfig {
    /// Language used when no preference is stored and when a bundle fails to
    /// load. Defaults to English.
    ///
    /// Blank values are treated as absent so templated files such as
    /// `default_language = ""` keep the built-in default.
    pub default_language: Option<String>,
    /// Directory holding `<code>.json` bundles read at load time instead of
    /// the embedded ones.
    pub locales_dir: Option<Utf8PathBuf>,
    /// Explicit preference file, overriding the per-user configuration
    /// directory.
    pub preference_file: Option<Utf8PathBuf>,
}

impl ManzilConfig {
    /// Parse configuration from TOML text.
    ///
    /// ```
    /// use manzil::ManzilConfig;
    ///
    /// let config = ManzilConfig::from_toml_str("default_language = \"ur\"")?;
    /// assert_eq!(config.default_language.as_deref(), Some("ur"));
    /// # Ok::<(), manzil::ConfigError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown fields.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse { source })
    }

    /// Load configuration from `path`, treating a missing file as defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file exists but cannot be read
    /// and [`ConfigError::Parse`] when it does not parse.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |candidate| std::fs::read_to_string(candidate))
    }

    /// Load configuration from `path` through `reader`.
    ///
    /// This exists so tests can feed configuration text without touching the
    /// file system. A reader returning [`io::ErrorKind::NotFound`] yields the
    /// defaults.
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use manzil::ManzilConfig;
    ///
    /// let config = ManzilConfig::load_with(Utf8Path::new("manzil.toml"), |_| {
    ///     Ok(String::from("locales_dir = \"/srv/locales\""))
    /// })?;
    /// assert_eq!(config.locales_dir().map(|dir| dir.as_str()), Some("/srv/locales"));
    /// # Ok::<(), manzil::ConfigError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates read failures other than a missing file, and parse errors.
    pub fn load_with<F>(path: &Utf8Path, reader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> io::Result<String>,
    {
        match reader(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                debug!(target: TARGET, "no configuration at {path}; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The configured primary language, if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLanguage`] when the value is not blank
    /// and does not name a known language.
    pub fn default_language(&self) -> Result<Option<Language>, ConfigError> {
        match self.default_language.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(code) => Ok(Some(code.parse()?)),
        }
    }

    /// The configured bundle directory, ignoring an empty path.
    #[must_use]
    pub fn locales_dir(&self) -> Option<&Utf8Path> {
        non_empty(self.locales_dir.as_deref())
    }

    /// The configured preference file, ignoring an empty path.
    #[must_use]
    pub fn preference_file(&self) -> Option<&Utf8Path> {
        non_empty(self.preference_file.as_deref())
    }
}

fn non_empty(path: Option<&Utf8Path>) -> Option<&Utf8Path> {
    path.filter(|candidate| !candidate.as_str().trim().is_empty())
}

/// Build an uninitialized resolver from `config` using the platform's
/// configuration directory.
///
/// # Errors
///
/// Fails when `default_language` is invalid.
pub fn build_resolver(config: &ManzilConfig) -> Result<LocaleResolver, ConfigError> {
    build_resolver_with(config, &SystemBaseDirs)
}

/// Build an uninitialized resolver from `config`, resolving the default
/// preference file through `dirs`.
///
/// When neither `preference_file` nor a configuration directory is
/// available, the preference lives in memory for the session only.
///
/// # Errors
///
/// Fails when `default_language` is invalid.
pub fn build_resolver_with(
    config: &ManzilConfig,
    dirs: &dyn BaseDirs,
) -> Result<LocaleResolver, ConfigError> {
    let registry = match config.locales_dir() {
        Some(dir) => {
            debug!(target: TARGET, "reading bundles from {dir}");
            LocaleRegistry::standard_with(DirectorySource::new(dir))
        }
        None => LocaleRegistry::standard(),
    };

    let registry = match config.default_language()? {
        Some(language) => registry.with_primary(language)?,
        None => registry,
    };

    Ok(LocaleResolver::with_shared_store(
        registry,
        preference_store(config, dirs),
    ))
}

fn preference_store(config: &ManzilConfig, dirs: &dyn BaseDirs) -> Arc<dyn PreferenceStore> {
    if let Some(path) = config.preference_file() {
        return Arc::new(FileStore::at(path));
    }

    match FileStore::in_config_dir(dirs) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            warn!(
                target: TARGET,
                "{error}; the language preference will not survive restarts",
            );
            Arc::new(MemoryStore::new())
        }
    }
}
