//! Deployment wiring for the Nayi Manzil locale resolver.
//!
//! The heavy lifting lives in the `common` crate. This crate reads
//! `manzil.toml` and assembles a [`common::i18n::LocaleResolver`] from it.

pub mod config;

pub use config::{CONFIG_FILE, ConfigError, ManzilConfig, build_resolver, build_resolver_with};
