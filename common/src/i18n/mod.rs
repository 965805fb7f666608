//! Locale resolution for the Nayi Manzil frontend.
//!
//! Views translate dotted keys such as `navigation.home` through a
//! [`LocaleResolver`]. The resolver tracks the user's language, loads that
//! language's JSON bundle through the [`LocaleRegistry`], and remembers the
//! choice in a [`PreferenceStore`]. Lookups are total: a missing key echoes
//! the key or a caller-supplied fallback, a missing list is empty, and a
//! bundle that fails to load is replaced by the primary language's bundle.
//!
//! Languages without a translation yet (Kashmiri and Dogri) are registry
//! aliases of English rather than load failures.

mod bundle;
mod dirs;
mod error;
mod language;
mod preference;
mod registry;
mod resolver;
mod source;
pub mod testing;

pub use bundle::{Bundle, Mapping, Node, missing_paths};
#[cfg(test)]
pub(crate) use dirs::MockBaseDirs;
pub use dirs::{BaseDirs, SystemBaseDirs};
pub use error::{LoadError, PreferenceError, RegistryError, UnknownLanguage};
pub use language::Language;
pub use preference::{FileStore, MemoryStore, PreferenceStore};
pub use registry::{LocaleRegistry, LocaleRegistryBuilder, RegistryEntry};
pub use resolver::{LoadOutcome, LocaleResolver, PendingLoad, ResolverPhase};
pub use source::{BundleSource, DirectorySource, EmbeddedSource, StaticSource};

/// Key under which the chosen language code is persisted.
pub const PREFERENCE_KEY: &str = "nayi-manzil-language";

/// Trim whitespace, discard blank input, and parse a language code.
///
/// ```
/// use common::i18n::{Language, normalise_language};
///
/// assert_eq!(normalise_language(Some(" hi ")), Some(Language::Hi));
/// assert_eq!(normalise_language(Some("  ")), None);
/// assert_eq!(normalise_language(Some("fr")), None);
/// ```
#[must_use]
pub fn normalise_language(input: Option<&str>) -> Option<Language> {
    input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}
