//! Error types for bundle loading, registry construction, and preference
//! persistence.
//!
//! None of these escape the resolver's lookup surface: load failures are
//! absorbed into the fallback policy and preference failures are logged.

use camino::Utf8PathBuf;
use thiserror::Error;

use super::Language;

/// Raised when a locale bundle cannot be produced for a language.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The language has no entry in the registry.
    #[error("language `{language}` is not registered")]
    Unregistered {
        /// Language that was requested.
        language: Language,
    },

    /// The bundle resource does not exist in the source.
    #[error("bundle resource `{resource}` is missing")]
    Missing {
        /// Resource name, for example `hi`.
        resource: String,
    },

    /// Reading the bundle resource failed.
    #[error("failed to read bundle resource `{resource}`: {source}")]
    Io {
        /// Resource name.
        resource: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bundle resource is not valid JSON.
    #[error("bundle resource `{resource}` is malformed: {source}")]
    Malformed {
        /// Resource name.
        resource: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The bundle parsed but its root is not a mapping.
    #[error("bundle resource `{resource}` must have a mapping at its root")]
    NotAMapping {
        /// Resource name.
        resource: String,
    },
}

/// Raised when a [`LocaleRegistry`](super::LocaleRegistry) is assembled with
/// inconsistent entries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No language was registered, so there is no primary language.
    #[error("a locale registry needs at least one language")]
    Empty,

    /// The same language was registered twice.
    #[error("language `{language}` is registered more than once")]
    Duplicate {
        /// Language registered twice.
        language: Language,
    },

    /// An alias points at a language that is not registered.
    #[error("language `{language}` aliases unregistered language `{target}`")]
    DanglingAlias {
        /// Aliased language.
        language: Language,
        /// Missing alias target.
        target: Language,
    },

    /// Following aliases from a language never reaches a dedicated bundle.
    #[error("aliases starting at `{language}` form a cycle")]
    AliasCycle {
        /// Language whose alias chain loops.
        language: Language,
    },

    /// The requested primary language is not registered.
    #[error("primary language `{language}` is not registered")]
    UnknownPrimary {
        /// Requested primary language.
        language: Language,
    },
}

/// Raised when the persisted language preference cannot be written.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// The platform configuration directory could not be determined.
    #[error("could not determine the configuration directory")]
    MissingConfigDirectory,

    /// Reading or writing the preference file failed.
    #[error("failed to access preference file {path}: {source}")]
    Io {
        /// Path to the preference file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialising the preferences failed.
    #[error("failed to serialise preferences: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: toml::ser::Error,
    },
}

/// Raised when a language code does not name a known language.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown language identifier `{code}`")]
pub struct UnknownLanguage {
    /// The rejected input, trimmed.
    pub code: String,
}
