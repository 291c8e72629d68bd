//! Core analysis pipeline for the Kansa JavaScript/TypeScript analysis bridge.
//!
//! Turns a unit of source text into a normalized analysis result: lint
//! issues, code metrics, highlighting and performance data, shaped for
//! consumption by a static-analysis host.

pub mod analysis;
pub mod config;
pub mod cpd;
pub mod highlight;
pub mod linter;
pub mod metrics;
pub mod parser;
pub mod perf;
pub mod position;
