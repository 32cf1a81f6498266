//! Checker layer: looks up the latest version of external data records
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ JsonChecker │────▶│  Sequence   │────▶│  Evaluator  │
//! │ (fetch+flow)│     │ (query plan)│     │    (jq)     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ├──────────────────┬───────────────────┐
//!        ▼                  ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Timestamp  │     │   Remote    │     │  Recorder   │
//! │  (ISO-8601) │     │(ls-remote)  │     │  (handoff)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`backend`]: `Checker` trait shared by data-source backends
//! - [`json`]: JSON document checker
//! - [`evaluator`]: jq query evaluation with scalar type enforcement
//! - [`sequence`]: Query plans and sequential resolution
//! - [`timestamp`]: Timestamp parsing for query results
//! - [`remote`]: Commit resolution for git tags
//! - [`recorder`]: Handoff and reporting of discovered versions
//! - [`error`]: Error types for checker operations

pub mod backend;
pub mod error;
pub mod evaluator;
pub mod json;
pub mod recorder;
pub mod remote;
pub mod sequence;
pub mod timestamp;
