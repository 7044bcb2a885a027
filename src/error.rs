//! Typed error taxonomy for the engine.
//!
//! Library code mostly threads `anyhow::Result` the way the rest of this
//! crate does, but the four failure modes below are distinguished so the
//! CLI and the planner can tell "could not even start" from "this subtree
//! of the file is corrupt, keep going" apart (see spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt database: {0}")]
    Corrupt(String),

    #[error("malformed sql: {0}")]
    Sql(String),
}
