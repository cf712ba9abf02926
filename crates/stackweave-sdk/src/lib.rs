//! # stackweave-sdk
//!
//! Public SDK for using Stackweave as a Rust library.
//!
//! Provides the main entry points:
//! - [`StackComposer`](composer::StackComposer): Batch configuration generation
//!   over a component graph, built with [`StackComposerBuilder`](builder::StackComposerBuilder).
//! - [`GraphResolver`](graph_resolver::GraphResolver): Loads manifests and
//!   resolves deployment order.
//! - [`assess`]: Blocking blast-radius assessment with a history source
//!   chosen at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use stackweave_common::manifest::StackManifest;
//! use stackweave_sdk::builder::StackComposerBuilder;
//! use stackweave_sdk::cancel::CancelToken;
//!
//! let manifest = StackManifest::load(std::path::Path::new("stack.yaml")).unwrap();
//! let composer = StackComposerBuilder::new().offline(true).build().unwrap();
//! let report = composer.generate_all(manifest.components, &CancelToken::new()).unwrap();
//! println!("{}", report.summary());
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod assess;
pub mod batch;
pub mod builder;
pub mod cancel;
pub mod composer;
pub mod graph_resolver;
