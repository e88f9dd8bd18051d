//! Error types for proxcanon.

use thiserror::Error;

/// Error type for compilation failures.
#[derive(Debug, Error)]
pub enum CanonError {
    /// Expression is not decomposable into known proximal templates.
    #[error("structural error: {0}")]
    Structural(String),

    /// Atom has no proximal template for the given argument shapes.
    #[error("unsupported atom `{atom}` with argument shapes {shapes}")]
    UnsupportedAtom {
        /// Surface name of the atom.
        atom: &'static str,
        /// Rendered argument shapes.
        shapes: String,
    },

    /// Expression nesting exceeds the configured depth limit.
    #[error("expression nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep {
        /// Measured nesting depth.
        depth: usize,
        /// The configured limit.
        limit: usize,
    },

    /// Post-condition violated; always indicates an upstream defect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Internal consistency failure (defensive check, not recoverable).
    #[error("internal consistency violation: {0}")]
    Internal(String),
}

/// Result type for compilation operations.
pub type Result<T> = std::result::Result<T, CanonError>;
