//! Error types for wcls-core.

use thiserror::Error;

/// Result type alias for wcls operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for wcls operations.
///
/// Every variant is fatal for the operation that raised it. Conditions that
/// are merely "nothing to do" (an empty collection, a deposit outside every
/// face) are not errors and never show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Binning with no bins or an empty range.
    #[error("invalid binning: {nbins} bins over [{min}, {max})")]
    InvalidBinning { nbins: i64, min: f64, max: f64 },

    /// A required labeled collection is absent from the event.
    #[error("event has no product labeled \"{label}\"")]
    InputMissing { label: String },

    /// An associated collection is not aligned with its primary collection.
    #[error("associated collection has {associated} entries, primary has {primary}")]
    InputSizeMismatch { primary: usize, associated: usize },

    /// Ground-truth cross-reference outside the collection.
    #[error("track index {index} outside ground-truth collection of {len}")]
    TrackIndex { index: i64, len: usize },

    /// Channel-mask triples whose length is not a multiple of three.
    #[error("channel mask array of length {len} is not a list of triples")]
    MalformedMask { len: usize },

    /// Deposit refers to a prior that does not precede it.
    #[error("deposit prior {prior} does not precede deposit {index}")]
    InvalidPrior { index: usize, prior: usize },
}

impl Error {
    /// Shorthand for a [`Error::Config`] from anything printable.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Shorthand for a [`Error::InputMissing`].
    pub fn missing(label: impl Into<String>) -> Self {
        Self::InputMissing {
            label: label.into(),
        }
    }
}
