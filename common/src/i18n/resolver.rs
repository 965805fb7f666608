//! Active-language state and total lookups over the active bundle.
//!
//! [`LocaleResolver`] owns the current language, the installed bundle, and a
//! request generation. Every language request bumps the generation and
//! returns a [`PendingLoad`]; a load commits only while its generation is
//! still the newest, so the bundle on screen always belongs to the most
//! recent request even when responses arrive out of order.
//!
//! Load failures never reach callers. A failed bundle is replaced by the
//! primary language's bundle, and if that fails too an empty bundle is
//! installed, under which every lookup echoes its key.

use std::future::IntoFuture;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_util::future::{BoxFuture, FutureExt};
use log::{debug, error, warn};
use tokio::runtime::{Builder, Handle};
use tokio::task::JoinHandle;

use super::{
    Bundle, Language, LoadError, LocaleRegistry, PREFERENCE_KEY, PreferenceStore,
    normalise_language,
};

const TARGET: &str = "i18n::resolver";

/// Visible lifecycle of a resolver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolverPhase {
    /// No load has been requested yet; lookups run against an empty bundle.
    Uninitialized,
    /// A bundle for the current language is being fetched.
    Loading,
    /// The newest request has installed its bundle (or a fallback).
    Ready,
}

/// What a finished load did to the resolver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    /// The load was the newest request and its result is now active.
    Installed {
        /// Language that was requested.
        language: Language,
        /// Language whose bundle is active, or `None` for the empty bundle.
        bundle_language: Option<Language>,
    },
    /// A newer request was issued first; the result was discarded.
    Superseded {
        /// Language that was requested.
        language: Language,
    },
    /// The load task was cancelled or panicked before it could commit.
    Abandoned {
        /// Language that was requested.
        language: Language,
    },
}

#[derive(Debug)]
struct ResolverState {
    phase: ResolverPhase,
    language: Language,
    bundle: Arc<Bundle>,
    bundle_language: Option<Language>,
    generation: u64,
}

/// Resolves translation keys for the user's chosen language.
///
/// Clones share state, so a clone can be handed to each view.
///
/// ```
/// use common::i18n::{Language, LocaleRegistry, LocaleResolver, MemoryStore};
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let resolver = LocaleResolver::new(LocaleRegistry::standard(), MemoryStore::new());
/// resolver.initialize().finish().await;
/// assert_eq!(resolver.t("navigation.home"), "Home");
///
/// if let Some(load) = resolver.change_language("hi") {
///     load.finish().await;
/// }
/// assert_eq!(resolver.current_language(), Language::Hi);
/// assert_eq!(resolver.t("navigation.home"), "होम");
/// assert_eq!(resolver.t("navigation.missing"), "navigation.missing");
/// # });
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct LocaleResolver {
    registry: Arc<LocaleRegistry>,
    store: Arc<dyn PreferenceStore>,
    state: Arc<RwLock<ResolverState>>,
}

impl LocaleResolver {
    /// Create an uninitialized resolver on the registry's primary language.
    #[must_use]
    pub fn new(registry: LocaleRegistry, store: impl PreferenceStore + 'static) -> Self {
        Self::with_shared_store(registry, Arc::new(store))
    }

    /// Create a resolver whose preference store is shared with the caller.
    #[must_use]
    pub fn with_shared_store(registry: LocaleRegistry, store: Arc<dyn PreferenceStore>) -> Self {
        let state = ResolverState {
            phase: ResolverPhase::Uninitialized,
            language: registry.primary(),
            bundle: Arc::new(Bundle::empty()),
            bundle_language: None,
            generation: 0,
        };

        Self {
            registry: Arc::new(registry),
            store,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Select the persisted language, or the primary language, and load it.
    ///
    /// The persisted preference is only read here; it is not rewritten.
    pub fn initialize(&self) -> PendingLoad {
        let stored = self.store.get(PREFERENCE_KEY);
        let language = match normalise_language(stored.as_deref()) {
            Some(language) if self.registry.contains(language) => {
                debug!(target: TARGET, "restoring persisted language `{language}`");
                language
            }
            _ => {
                if let Some(raw) = stored.as_deref() {
                    debug!(
                        target: TARGET,
                        "ignoring persisted language `{raw}`; using `{}`",
                        self.registry.primary(),
                    );
                }
                self.registry.primary()
            }
        };

        self.begin(language)
    }

    /// Switch to the language named by `code`.
    ///
    /// Unknown or unregistered codes are ignored and return `None`, leaving the
    /// current language and bundle untouched.
    pub fn change_language(&self, code: &str) -> Option<PendingLoad> {
        match code.parse::<Language>() {
            Ok(language) => self.select(language),
            Err(error) => {
                debug!(target: TARGET, "ignoring language change: {error}");
                None
            }
        }
    }

    /// Switch to `language`, persisting the choice.
    ///
    /// Returns `None` without side effects when `language` is not registered.
    pub fn select(&self, language: Language) -> Option<PendingLoad> {
        if !self.registry.contains(language) {
            debug!(target: TARGET, "ignoring unregistered language `{language}`");
            return None;
        }

        let pending = self.begin(language);
        if let Err(error) = self.store.set(PREFERENCE_KEY, language.code()) {
            warn!(
                target: TARGET,
                "could not persist language `{language}`: {error}",
            );
        }
        Some(pending)
    }

    /// Translate `key`, echoing the key itself on a miss.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.read().bundle.translate(key, None)
    }

    /// Translate `key`, returning `fallback` on a miss.
    #[must_use]
    pub fn t_or(&self, key: &str, fallback: &str) -> String {
        self.read().bundle.translate(key, Some(fallback))
    }

    /// Translate `key` to a string list, or an empty list on a miss.
    #[must_use]
    pub fn t_array(&self, key: &str) -> Vec<String> {
        self.read().bundle.translate_list(key)
    }

    /// The most recently requested language.
    #[must_use]
    pub fn current_language(&self) -> Language {
        self.read().language
    }

    /// Whether the newest request is still loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == ResolverPhase::Loading
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ResolverPhase {
        self.read().phase
    }

    /// Language whose bundle is active, or `None` while the empty bundle is.
    #[must_use]
    pub fn bundle_language(&self) -> Option<Language> {
        self.read().bundle_language
    }

    /// Whether the active bundle belongs to a different language than the one
    /// requested because the requested bundle failed to load.
    ///
    /// Registry aliases are not counted: an alias serving its target's bundle
    /// is the expected outcome.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        let state = self.read();
        state.phase == ResolverPhase::Ready
            && state.bundle_language != self.registry.bundle_language(state.language)
    }

    /// Snapshot of the active bundle.
    #[must_use]
    pub fn bundle(&self) -> Arc<Bundle> {
        Arc::clone(&self.read().bundle)
    }

    /// Registered languages in picker order.
    #[must_use]
    pub fn languages(&self) -> Vec<Language> {
        self.registry.languages().collect()
    }

    /// The registry the resolver loads from.
    #[must_use]
    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    /// Human-readable name of `language`.
    #[must_use]
    pub const fn display_name(language: Language) -> &'static str {
        LocaleRegistry::display_name(language)
    }

    fn begin(&self, language: Language) -> PendingLoad {
        let generation = {
            let mut state = self.write();
            state.generation = state.generation.wrapping_add(1);
            state.language = language;
            state.phase = ResolverPhase::Loading;
            state.generation
        };

        let request = self.registry.load(language);
        let resolver = self.clone();
        let future = async move { resolver.complete(language, generation, request).await }.boxed();

        let driver = match Handle::try_current() {
            Ok(handle) => LoadDriver::Spawned(handle.spawn(future)),
            Err(_) => LoadDriver::Deferred(future),
        };

        PendingLoad {
            language,
            generation,
            driver: Some(driver),
        }
    }

    async fn complete(
        self,
        language: Language,
        generation: u64,
        request: BoxFuture<'static, Result<Bundle, LoadError>>,
    ) -> LoadOutcome {
        let (bundle, bundle_language) = match request.await {
            Ok(bundle) => {
                let served = self.registry.bundle_language(language).unwrap_or(language);
                (bundle, Some(served))
            }
            Err(load_error) => {
                if !self.is_current(generation) {
                    debug!(
                        target: TARGET,
                        "skipping fallback for superseded `{language}` load: {load_error}",
                    );
                    return LoadOutcome::Superseded { language };
                }
                self.fallback(language, &load_error).await
            }
        };

        self.commit(language, generation, bundle, bundle_language)
    }

    async fn fallback(&self, language: Language, load_error: &LoadError) -> (Bundle, Option<Language>) {
        let primary = self.registry.primary();
        let primary_served = self.registry.bundle_language(primary);

        if primary_served == self.registry.bundle_language(language) {
            error!(
                target: TARGET,
                "failed to load primary `{primary}` bundle: {load_error}; lookups will echo keys",
            );
            return (Bundle::empty(), None);
        }

        warn!(
            target: TARGET,
            "failed to load `{language}` bundle: {load_error}; falling back to `{primary}`",
        );

        match self.registry.load(primary).await {
            Ok(bundle) => (bundle, primary_served),
            Err(fallback_error) => {
                error!(
                    target: TARGET,
                    "failed to load fallback `{primary}` bundle: {fallback_error}; lookups will echo keys",
                );
                (Bundle::empty(), None)
            }
        }
    }

    fn commit(
        &self,
        language: Language,
        generation: u64,
        bundle: Bundle,
        bundle_language: Option<Language>,
    ) -> LoadOutcome {
        let mut state = self.write();
        if state.generation != generation {
            debug!(
                target: TARGET,
                "discarding superseded `{language}` bundle (request {generation}, newest {})",
                state.generation,
            );
            return LoadOutcome::Superseded { language };
        }

        state.bundle = Arc::new(bundle);
        state.bundle_language = bundle_language;
        state.phase = ResolverPhase::Ready;
        LoadOutcome::Installed {
            language,
            bundle_language,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.read().generation == generation
    }

    fn read(&self) -> RwLockReadGuard<'_, ResolverState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResolverState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A requested bundle load that has not completed yet.
///
/// Inside a tokio runtime the load is spawned as soon as it is requested and
/// runs whether or not this handle is awaited. Outside a runtime it runs when
/// awaited; dropping it unawaited drives it to completion on a temporary
/// current-thread runtime, so the resolver never stays loading because a
/// caller ignored the request.
#[must_use = "await the load to observe its outcome; dropping it still completes the load"]
pub struct PendingLoad {
    language: Language,
    generation: u64,
    driver: Option<LoadDriver>,
}

enum LoadDriver {
    Spawned(JoinHandle<LoadOutcome>),
    Deferred(BoxFuture<'static, LoadOutcome>),
}

impl PendingLoad {
    /// Language this load was requested for.
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Request generation this load is tagged with.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the load to complete.
    pub async fn finish(mut self) -> LoadOutcome {
        let language = self.language;
        match self.driver.take() {
            Some(LoadDriver::Spawned(task)) => task.await.unwrap_or_else(|join_error| {
                warn!(target: TARGET, "`{language}` load did not complete: {join_error}");
                LoadOutcome::Abandoned { language }
            }),
            Some(LoadDriver::Deferred(future)) => future.await,
            None => LoadOutcome::Abandoned { language },
        }
    }

    /// Hand the load to the ambient tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when the load was requested outside a runtime and this is
    /// called outside one too.
    pub fn spawn(mut self) -> JoinHandle<LoadOutcome> {
        let language = self.language;
        match self.driver.take() {
            Some(LoadDriver::Spawned(task)) => task,
            Some(LoadDriver::Deferred(future)) => tokio::spawn(future),
            None => tokio::spawn(async move { LoadOutcome::Abandoned { language } }),
        }
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        if let Some(LoadDriver::Deferred(future)) = self.driver.take() {
            drive_detached(self.language, future);
        }
    }
}

/// Complete a load nobody is waiting for.
fn drive_detached(language: Language, future: BoxFuture<'static, LoadOutcome>) {
    if let Ok(handle) = Handle::try_current() {
        drop(handle.spawn(future));
        return;
    }

    match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => {
            let outcome = runtime.block_on(future);
            debug!(target: TARGET, "unawaited `{language}` load finished: {outcome:?}");
        }
        Err(build_error) => {
            error!(
                target: TARGET,
                "cannot drive unawaited `{language}` load: {build_error}",
            );
        }
    }
}

impl IntoFuture for PendingLoad {
    type Output = LoadOutcome;
    type IntoFuture = BoxFuture<'static, LoadOutcome>;

    fn into_future(self) -> Self::IntoFuture {
        self.finish().boxed()
    }
}

impl std::fmt::Debug for PendingLoad {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let driver = match self.driver {
            Some(LoadDriver::Spawned(_)) => "spawned",
            Some(LoadDriver::Deferred(_)) => "deferred",
            None => "taken",
        };
        formatter
            .debug_struct("PendingLoad")
            .field("language", &self.language)
            .field("generation", &self.generation)
            .field("driver", &driver)
            .finish()
    }
}
