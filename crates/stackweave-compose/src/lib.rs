//! # stackweave-compose
//!
//! Stack composition for the Stackweave engine.
//!
//! Handles:
//! - **Graph**: Dependency graph construction from component declarations,
//!   cycle checks, and deployment ordering.
//! - **Mapper**: Inference of which input receives a dependency output.
//! - **Patterns**: The built-in table of infrastructure wiring patterns.
//! - **Mock**: Placeholder outputs for not-yet-deployed dependencies.
//! - **HCL**: Rendering of configuration documents.
//! - **Generator**: Per-component configuration generation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod generator;
pub mod graph;
pub mod hcl;
pub mod mapper;
pub mod mock;
pub mod patterns;

pub use generator::{ConfigGenerator, GeneratedConfig};
pub use graph::{BuildFailure, DependencyEdge, DependencyGraph, DuplicateDeclaration, GraphBuild};
pub use mapper::VariableMapper;
