//! Error type shared by all fallible operations of this crate.

use thiserror::Error;

/// Errors that can occur while sampling, integrating, or sweeping.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument is outside of its admissible range, for example a sample count of zero.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The reference value is zero, so the relative error is undefined.
    #[error("reference value is zero, the relative error is undefined")]
    DegenerateReference,

    /// A configuration could not be parsed, or a result could not be serialized.
    #[error("invalid JSON: {0}")]
    Config(#[from] serde_json::Error),

    /// Reading a configuration or writing checkpoints failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker thread panicked during a parallel iteration.
    #[error("a worker thread panicked")]
    Worker,
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
