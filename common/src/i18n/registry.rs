//! Language registry and bundle loading.
//!
//! The registry fixes which languages can be selected and how each one gets
//! its bundle. A language either has a dedicated bundle resource or is an
//! alias that borrows another language's bundle until a translation exists.
//! The first registered language is the primary language used for fallback.

use std::borrow::Cow;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use log::debug;

use super::{Bundle, BundleSource, EmbeddedSource, Language, LoadError, RegistryError};

const TARGET: &str = "i18n::registry";

/// How a registered language obtains its bundle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistryEntry {
    /// The language has its own bundle resource.
    Dedicated {
        /// Resource name passed to the [`BundleSource`].
        resource: Cow<'static, str>,
    },
    /// The language is not translated yet and reuses `target`'s bundle.
    Alias {
        /// Language whose bundle is served instead.
        target: Language,
    },
}

/// Fixed association of languages with bundle loaders.
#[derive(Clone, Debug)]
pub struct LocaleRegistry {
    entries: Vec<(Language, RegistryEntry)>,
    primary: Language,
    source: Arc<dyn BundleSource>,
}

impl LocaleRegistry {
    /// The shipped registry over the embedded bundles.
    ///
    /// English is primary; Hindi and Urdu have dedicated bundles; Kashmiri and
    /// Dogri are aliases of English until their translations land.
    ///
    /// ```
    /// use common::i18n::{Language, LocaleRegistry};
    ///
    /// let registry = LocaleRegistry::standard();
    /// assert_eq!(registry.primary(), Language::En);
    /// assert!(registry.is_alias(Language::Ks));
    /// ```
    #[must_use]
    pub fn standard() -> Self {
        Self::standard_with(EmbeddedSource)
    }

    /// The shipped language layout over a caller-supplied source.
    #[must_use]
    pub fn standard_with(source: impl BundleSource + 'static) -> Self {
        Self {
            entries: vec![
                (Language::En, dedicated("en")),
                (Language::Hi, dedicated("hi")),
                (Language::Ur, dedicated("ur")),
                (
                    Language::Ks,
                    RegistryEntry::Alias {
                        target: Language::En,
                    },
                ),
                (
                    Language::Dg,
                    RegistryEntry::Alias {
                        target: Language::En,
                    },
                ),
            ],
            primary: Language::En,
            source: Arc::new(source),
        }
    }

    /// Start assembling a registry over `source`.
    #[must_use]
    pub fn builder(source: impl BundleSource + 'static) -> LocaleRegistryBuilder {
        LocaleRegistryBuilder {
            entries: Vec::new(),
            source: Arc::new(source),
        }
    }

    /// Return a copy of the registry with `language` as the primary language.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownPrimary`] when `language` is not
    /// registered.
    pub fn with_primary(mut self, language: Language) -> Result<Self, RegistryError> {
        if !self.contains(language) {
            return Err(RegistryError::UnknownPrimary { language });
        }
        self.primary = language;
        Ok(self)
    }

    /// The language whose bundle backs every failed load.
    #[must_use]
    pub const fn primary(&self) -> Language {
        self.primary
    }

    /// Registered languages in registration order.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.entries.iter().map(|(language, _)| *language)
    }

    /// Whether `language` can be selected.
    #[must_use]
    pub fn contains(&self, language: Language) -> bool {
        self.entry(language).is_some()
    }

    /// The registry entry for `language`, if registered.
    #[must_use]
    pub fn entry(&self, language: Language) -> Option<&RegistryEntry> {
        self.entries
            .iter()
            .find_map(|(candidate, entry)| (*candidate == language).then_some(entry))
    }

    /// Whether `language` borrows another language's bundle.
    #[must_use]
    pub fn is_alias(&self, language: Language) -> bool {
        matches!(self.entry(language), Some(RegistryEntry::Alias { .. }))
    }

    /// Human-readable name of `language` for language pickers.
    #[must_use]
    pub const fn display_name(language: Language) -> &'static str {
        language.display_name()
    }

    /// The language whose bundle actually serves `language`, after aliases.
    #[must_use]
    pub fn bundle_language(&self, language: Language) -> Option<Language> {
        self.resolve_dedicated(language).map(|(resolved, _)| resolved)
    }

    /// Load the bundle for `language`.
    ///
    /// The source is queried before this returns; the returned future only
    /// awaits the fetch and parses the document.
    pub fn load(&self, language: Language) -> BoxFuture<'static, Result<Bundle, LoadError>> {
        let Some((resolved, resource)) = self.resolve_dedicated(language) else {
            return future::ready(Err(LoadError::Unregistered { language })).boxed();
        };

        if resolved != language {
            debug!(
                target: TARGET,
                "`{language}` has no dedicated bundle; serving `{resolved}`",
            );
        }

        let resource = resource.to_owned();
        let fetch = self.source.fetch(&resource);
        async move {
            let text = fetch.await?;
            Bundle::from_json(&resource, &text)
        }
        .boxed()
    }

    fn resolve_dedicated(&self, language: Language) -> Option<(Language, &str)> {
        let mut current = language;
        // Each hop visits a distinct entry in a validated registry.
        for _ in 0..=self.entries.len() {
            match self.entry(current)? {
                RegistryEntry::Dedicated { resource } => return Some((current, resource.as_ref())),
                RegistryEntry::Alias { target } => current = *target,
            }
        }
        None
    }
}

fn dedicated(resource: &'static str) -> RegistryEntry {
    RegistryEntry::Dedicated {
        resource: Cow::Borrowed(resource),
    }
}

/// Incremental construction of a [`LocaleRegistry`].
#[derive(Debug)]
#[must_use]
pub struct LocaleRegistryBuilder {
    entries: Vec<(Language, RegistryEntry)>,
    source: Arc<dyn BundleSource>,
}

impl LocaleRegistryBuilder {
    /// Register `language` with its own bundle `resource`.
    pub fn dedicated(mut self, language: Language, resource: impl Into<Cow<'static, str>>) -> Self {
        self.entries.push((
            language,
            RegistryEntry::Dedicated {
                resource: resource.into(),
            },
        ));
        self
    }

    /// Register `language` as served by `target`'s bundle.
    pub fn alias(mut self, language: Language, target: Language) -> Self {
        self.entries.push((language, RegistryEntry::Alias { target }));
        self
    }

    /// Validate the entries and build the registry.
    ///
    /// The first registered language becomes primary.
    ///
    /// # Errors
    ///
    /// Fails when no language is registered, a language is registered twice,
    /// or an alias chain does not end at a dedicated bundle.
    pub fn build(self) -> Result<LocaleRegistry, RegistryError> {
        let primary = self
            .entries
            .first()
            .map(|(language, _)| *language)
            .ok_or(RegistryError::Empty)?;

        for (index, (language, _)) in self.entries.iter().enumerate() {
            let duplicated = self
                .entries
                .iter()
                .skip(index + 1)
                .any(|(other, _)| other == language);
            if duplicated {
                return Err(RegistryError::Duplicate {
                    language: *language,
                });
            }
        }

        let registry = LocaleRegistry {
            entries: self.entries,
            primary,
            source: self.source,
        };

        for (language, entry) in &registry.entries {
            if let RegistryEntry::Alias { target } = entry {
                if !registry.contains(*target) {
                    return Err(RegistryError::DanglingAlias {
                        language: *language,
                        target: *target,
                    });
                }
                if registry.resolve_dedicated(*language).is_none() {
                    return Err(RegistryError::AliasCycle {
                        language: *language,
                    });
                }
            }
        }

        Ok(registry)
    }
}
