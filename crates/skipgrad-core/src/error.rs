//! Centralized error types for skipgrad.
//!
//! Uses thiserror for ergonomic error handling with context.
//!
//! There are only two failure families in the numeric core: a fatal
//! initialization failure (the dot-product precision probe cannot classify
//! the primitive's return convention) and precondition violations (a key
//! indexes past its table, or parallel arrays disagree on shape). Neither is
//! recoverable mid-call; kernels validate everything before mutating.

use thiserror::Error;

/// Main error type for skipgrad operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SkipgradError {
    /// The dot primitive's return width could not be determined by the
    /// startup self-test. No kernel can run safely after this.
    #[error(
        "dot primitive precision undetermined: raw bits {bits:#018x} match \
         neither f64 nor f32 for expected {expected}"
    )]
    PrecisionUndetermined { bits: u64, expected: f32 },

    /// A key array referenced a row outside its table.
    #[error("key {key} out of range for table with {rows} rows")]
    KeyOutOfRange { key: u32, rows: usize },

    /// A flat buffer does not match its declared rows*dim shape.
    #[error("buffer length {len} does not match shape {rows}x{dim}")]
    BadTableShape { len: usize, rows: usize, dim: usize },

    /// Two parallel arrays disagree on length.
    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Interacting tables disagree on embedding dimension.
    #[error("embedding dim mismatch: {left} vs {right}")]
    DimMismatch { left: usize, right: usize },

    /// Invalid configuration detected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper (config layer).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error (config layer).
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, SkipgradError>;

impl SkipgradError {
    /// Whether this error means process startup must abort: the numeric
    /// primitives cannot be trusted, so no later call can be issued.
    pub fn is_fatal_init(&self) -> bool {
        matches!(self, SkipgradError::PrecisionUndetermined { .. })
    }
}
