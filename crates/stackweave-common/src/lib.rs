//! # stackweave-common
//!
//! Shared types, error definitions, configuration models, manifest loading,
//! and constants used across the entire Stackweave workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the records every other crate builds upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod manifest;
pub mod types;
