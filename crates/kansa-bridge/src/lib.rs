//! Dialect adapters for the Kansa analysis bridge.
//!
//! One adapter per source dialect: each configures the rule engine once,
//! then analyzes code units against a fixed synthetic file path and
//! enriches every reported issue with absolute character offsets for the
//! host's diagnostic overlay.

pub mod adapter;
pub mod protocol;

pub use adapter::{BridgeError, JsAdapter, TsAdapter};
pub use protocol::{AnalysisRequest, BridgeAnalysis, InitLinterRequest, TsRawResponse};
