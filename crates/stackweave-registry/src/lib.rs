//! # stackweave-registry
//!
//! Module contract resolution for the Stackweave engine.
//!
//! Handles:
//! - **Client**: [`RegistryClient`](client::RegistryClient) memoizes
//!   resolutions by module identity and coalesces concurrent fetches.
//! - **Cache**: [`ModuleCache`](cache::ModuleCache), an explicitly constructed,
//!   bounded, TTL-evicting store injected into the client.
//! - **HTTP**: a Terraform-registry-compatible remote source.
//! - **Catalog**: static and offline registries for local use and tests.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cache;
pub mod catalog;
pub mod client;
pub mod http;

pub use cache::ModuleCache;
pub use client::{ModuleRegistry, RegistryClient, RegistryError};
