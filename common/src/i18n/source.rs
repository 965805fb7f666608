//! Where bundle documents come from.
//!
//! A [`BundleSource`] turns a resource name such as `hi` into the JSON text of
//! that bundle. The registry owns one source and parses what it returns.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use futures_util::future::{self, BoxFuture, FutureExt};

use super::LoadError;

/// Asynchronous provider of bundle documents.
pub trait BundleSource: fmt::Debug + Send + Sync {
    /// Fetch the JSON text of `resource`.
    ///
    /// The returned future owns everything it needs so that loads can outlive
    /// the borrow of the source.
    fn fetch(&self, resource: &str) -> BoxFuture<'static, Result<String, LoadError>>;
}

impl<S: BundleSource + ?Sized> BundleSource for Arc<S> {
    fn fetch(&self, resource: &str) -> BoxFuture<'static, Result<String, LoadError>> {
        (**self).fetch(resource)
    }
}

const EMBEDDED_EN: &str = include_str!("../../../locales/en.json");
const EMBEDDED_HI: &str = include_str!("../../../locales/hi.json");
const EMBEDDED_UR: &str = include_str!("../../../locales/ur.json");

/// Bundles compiled into the binary from the workspace `locales/` directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedSource;

impl EmbeddedSource {
    /// Resource names available from the embedded bundles.
    pub const RESOURCES: [&'static str; 3] = ["en", "hi", "ur"];

    fn document(resource: &str) -> Option<&'static str> {
        match resource {
            "en" => Some(EMBEDDED_EN),
            "hi" => Some(EMBEDDED_HI),
            "ur" => Some(EMBEDDED_UR),
            _ => None,
        }
    }
}

impl BundleSource for EmbeddedSource {
    fn fetch(&self, resource: &str) -> BoxFuture<'static, Result<String, LoadError>> {
        let outcome = Self::document(resource)
            .map(str::to_owned)
            .ok_or_else(|| LoadError::Missing {
                resource: resource.to_owned(),
            });
        future::ready(outcome).boxed()
    }
}

/// Bundles read from `<root>/<resource>.json` at load time.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: Utf8PathBuf,
}

impl DirectorySource {
    /// Read bundles from `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the bundles are read from.
    #[must_use]
    pub fn root(&self) -> &Utf8PathBuf {
        &self.root
    }
}

impl BundleSource for DirectorySource {
    fn fetch(&self, resource: &str) -> BoxFuture<'static, Result<String, LoadError>> {
        let path = self.root.join(format!("{resource}.json"));
        let resource = resource.to_owned();

        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => Ok(text),
                Err(source) if source.kind() == io::ErrorKind::NotFound => {
                    Err(LoadError::Missing { resource })
                }
                Err(source) => Err(LoadError::Io { resource, source }),
            }
        }
        .boxed()
    }
}

/// Bundles held in memory, keyed by resource name.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    documents: HashMap<String, String>,
}

impl StaticSource {
    /// An empty source; every fetch reports a missing resource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the document for `resource`.
    #[must_use]
    pub fn with(mut self, resource: impl Into<String>, json: impl Into<String>) -> Self {
        self.documents.insert(resource.into(), json.into());
        self
    }
}

impl BundleSource for StaticSource {
    fn fetch(&self, resource: &str) -> BoxFuture<'static, Result<String, LoadError>> {
        let outcome = self
            .documents
            .get(resource)
            .cloned()
            .ok_or_else(|| LoadError::Missing {
                resource: resource.to_owned(),
            });
        future::ready(outcome).boxed()
    }
}
