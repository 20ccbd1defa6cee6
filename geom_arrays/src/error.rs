//! Error type shared by the point array, iterator, and transform operations.

/// Errors raised by point array, iterator, and transform operations.
///
/// Index and range errors are programming errors on the caller side and are never recovered
/// internally. [ArrayError::NotInvertible] is the one kind the rendering cache recovers from on its
/// own (by rebuilding from the source data).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrayError {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("unsupported operation: {operation}")]
    Unsupported { operation: &'static str },

    #[error("transform is not invertible (determinant {determinant})")]
    NotInvertible { determinant: f64 },

    #[error("bad ordinate range [{lower}, {upper}) for buffer of length {len}")]
    BadRange {
        lower: usize,
        upper: usize,
        len: usize,
    },

    #[error("no point remaining in iterator")]
    Exhausted,

    #[error("iterator ordinates read out of order, expected call to {expected}")]
    IteratorOrder { expected: &'static str },
}

pub type Result<T, E = ArrayError> = std::result::Result<T, E>;
