//! Test doubles for exercising the resolver without real storage or timing.
//!
//! [`ScriptedSource`] lets a test decide when, and with what, each bundle fetch
//! resolves, which is how out-of-order responses are reproduced.
//! [`FailingStore`] rejects every write. [`FixedBaseDirs`] reports a chosen
//! configuration directory. [`StepValue`] parses quoted parameters of
//! behaviour-driven steps.

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::io;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use camino::Utf8PathBuf;
use futures_util::future::{self, BoxFuture, FutureExt};
use tokio::sync::oneshot;

use super::{BaseDirs, BundleSource, LoadError, PreferenceError, PreferenceStore};

/// Bundle source whose fetches resolve when the test says so.
///
/// Each call to [`ScriptedSource::script`] queues one gated response for a
/// resource; fetches consume gates in order. When no gate is queued the fetch
/// resolves immediately from the documents registered with
/// [`ScriptedSource::ready`], or reports the resource as missing.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<Result<String, LoadError>>>>>,
    documents: Mutex<HashMap<String, String>>,
    fetches: Mutex<Vec<String>>,
}

impl ScriptedSource {
    /// A source with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `json` immediately for every unscripted fetch of `resource`.
    pub fn ready(&self, resource: impl Into<String>, json: impl Into<String>) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource.into(), json.into());
    }

    /// Queue a gated response for the next fetch of `resource`.
    pub fn script(&self, resource: impl Into<String>) -> ScriptHandle {
        let (sender, receiver) = oneshot::channel();
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(resource.into())
            .or_default()
            .push_back(receiver);
        ScriptHandle { sender }
    }

    /// Resources fetched so far, in call order.
    #[must_use]
    pub fn fetches(&self) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BundleSource for ScriptedSource {
    fn fetch(&self, resource: &str) -> BoxFuture<'static, Result<String, LoadError>> {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resource.to_owned());

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(resource)
            .and_then(VecDeque::pop_front);

        let owned = resource.to_owned();
        match gate {
            Some(receiver) => async move {
                receiver
                    .await
                    .unwrap_or_else(|_| Err(LoadError::Missing { resource: owned }))
            }
            .boxed(),
            None => {
                let document = self
                    .documents
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(resource)
                    .cloned();
                future::ready(document.ok_or(LoadError::Missing { resource: owned })).boxed()
            }
        }
    }
}

/// Controls a single gated fetch queued by [`ScriptedSource::script`].
///
/// Dropping the handle without responding resolves the fetch as missing.
#[derive(Debug)]
pub struct ScriptHandle {
    sender: oneshot::Sender<Result<String, LoadError>>,
}

impl ScriptHandle {
    /// Resolve the fetch with `json`.
    pub fn deliver(self, json: impl Into<String>) {
        // The fetch may already have been dropped; nothing is waiting then.
        let _ = self.sender.send(Ok(json.into()));
    }

    /// Resolve the fetch with `error`.
    pub fn fail(self, error: LoadError) {
        let _ = self.sender.send(Err(error));
    }
}

/// Preference store that remembers nothing and rejects every write.
#[derive(Debug, Default)]
pub struct FailingStore {
    stored: Option<String>,
}

impl FailingStore {
    /// A store that reads as empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reads `value` for every key.
    #[must_use]
    pub fn reading(value: impl Into<String>) -> Self {
        Self {
            stored: Some(value.into()),
        }
    }
}

impl PreferenceStore for FailingStore {
    fn get(&self, _key: &str) -> Option<String> {
        self.stored.clone()
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PreferenceError> {
        Err(PreferenceError::Io {
            path: Utf8PathBuf::from("<failing store>"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "writes are rejected"),
        })
    }
}

/// [`BaseDirs`] that reports a fixed configuration directory.
#[derive(Clone, Debug, Default)]
pub struct FixedBaseDirs {
    config_dir: Option<Utf8PathBuf>,
}

impl FixedBaseDirs {
    /// Report `config_dir` as the configuration directory.
    #[must_use]
    pub fn new(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: Some(config_dir.into()),
        }
    }

    /// Report that the platform has no configuration directory.
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }
}

impl BaseDirs for FixedBaseDirs {
    fn manzil_config_dir(&self) -> Option<Utf8PathBuf> {
        self.config_dir.clone()
    }
}

/// Quoted value captured from a behaviour-driven step: a language code, a
/// key, a path, or expected text.
///
/// ```
/// use common::i18n::testing::StepValue;
///
/// let value: StepValue = "\"navigation.home\"".parse()?;
/// assert_eq!(value.as_str(), "navigation.home");
/// # Ok::<(), std::convert::Infallible>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepValue(String);

impl FromStr for StepValue {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let unquoted = input
            .trim()
            .trim_matches(|candidate| matches!(candidate, '"' | '\''));
        Ok(Self(unquoted.to_owned()))
    }
}

impl StepValue {
    /// Borrow the unquoted value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the step value, yielding the unquoted string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}
