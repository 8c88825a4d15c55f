//! Error types for the cache hierarchy simulator

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a simulation
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid cache geometry
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed trace line
    #[error("trace error: {0}")]
    Trace(#[from] TraceParseError),

    /// Replacement set contract breach inside the simulator
    #[error("internal invariant violation: {0}")]
    Violation(#[from] SetViolation),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cache geometry that cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{cache}: {field} must be greater than zero")]
    ZeroDimension {
        cache: &'static str,
        field: &'static str,
    },

    #[error("{cache}: size {size} is not a multiple of assoc ({assoc}) x block size ({block_size})")]
    Indivisible {
        cache: &'static str,
        size: usize,
        assoc: usize,
        block_size: usize,
    },
}

/// A trace line that is not `<r|w> <hex address>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceParseError {
    #[error("line {line}: expected `<op> <address>`, found {found} token(s)")]
    TokenCount { line: usize, found: usize },

    #[error("line {line}: unknown operation `{op}`")]
    UnknownOp { line: usize, op: String },

    #[error("line {line}: `{address}` is not a hexadecimal address")]
    BadAddress { line: usize, address: String },
}

/// Breach of a `ReplacementSet` precondition.
///
/// These are unreachable when the controller respects the call discipline;
/// they are reported instead of being ignored.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetViolation {
    #[error("evict from an empty set")]
    Empty,

    #[error("insert into a full set of {assoc} way(s)")]
    Full { assoc: usize },

    #[error("tag {tag:#x} is not resident")]
    Absent { tag: u64 },

    #[error("tag {tag:#x} is already resident")]
    Duplicate { tag: u64 },
}
