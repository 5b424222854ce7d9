//! Scoring engine and session-scoring lifecycle for evaluation scorecards.
//!
//! The [`scoring`] module holds the deterministic core: per-type score
//! validation, criterion evaluation, aggregation across a template snapshot,
//! and the guarded session state machine. The remaining modules carry the
//! service plumbing (configuration, telemetry, HTTP error mapping) shared by
//! the API binary.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
