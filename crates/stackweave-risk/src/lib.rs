//! # stackweave-risk
//!
//! Blast-radius analysis for planned stack changes.
//!
//! Handles:
//! - **Factors**: The static registry of weighted risk factors and their
//!   bucket functions.
//! - **History**: Commit-count lookups used by the frequency and recency
//!   factors.
//! - **Propagation**: Spreading a change set over dependency edges.
//! - **Assessment**: Risk tiers, change types, and the derived guidance.
//! - **Analyzer**: The end-to-end [`BlastRadiusAnalyzer`](analyzer::BlastRadiusAnalyzer).

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod analyzer;
pub mod assessment;
pub mod factors;
pub mod history;
pub mod propagation;

pub use analyzer::BlastRadiusAnalyzer;
pub use assessment::{BlastRadiusAssessment, ChangeType, RiskLevel};
pub use history::History;
