//! Shared locale infrastructure for Nayi Manzil: bundle model, language
//! registry, preference persistence, and the resolver the views call into.

pub mod i18n;

pub use i18n::{
    Bundle, BundleSource, DirectorySource, EmbeddedSource, FileStore, Language, LoadError,
    LoadOutcome, LocaleRegistry, LocaleResolver, MemoryStore, PREFERENCE_KEY, PendingLoad,
    PreferenceError, PreferenceStore, RegistryError, ResolverPhase, normalise_language,
};
