//! Writer error taxonomy

use thiserror::Error;

/// Result alias used throughout the writer
pub type WriteResult<T> = Result<T, WriteError>;

/// A module could not be encoded as text
#[derive(Debug, Error)]
pub enum WriteError {
    /// The signature of a call target could not be recovered from the model
    #[error("cannot resolve the signature of call target {target}")]
    UnresolvedCallTarget {
        /// Rendered value text of the target
        target: String,
    },

    /// An operand did not have the shape the grammar requires
    #[error("{instruction}: {what}")]
    UnexpectedShape {
        /// Mnemonic of the instruction being encoded
        instruction: &'static str,
        /// Description of the offending operand
        what: String,
    },

    /// A construct the textual grammar cannot encode
    #[error("cannot encode {construct}")]
    Unsupported {
        /// Name of the construct
        construct: String,
    },

    /// Formatting into the output sink failed
    #[error("failed to write output")]
    Fmt(#[from] std::fmt::Error),
}
