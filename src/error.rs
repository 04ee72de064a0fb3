use core::fmt;

/// Result alias for `axil`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by hierarchy extraction and materialization.
///
/// None of these are transient: they indicate malformed input, an
/// incompatible restoration function, or an unusable output sink, and are
/// surfaced to the caller without retry.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The cluster order contained no entries.
    EmptyOrder,

    /// An order entry's preference vector width disagrees with the order.
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// The cluster order violates a builder invariant.
    MalformedOrder {
        /// Description of the violation.
        message: String,
    },

    /// A member's value cannot be passed through the restoration function.
    ///
    /// Aborts the remaining materialization; units already flushed are kept.
    IncompatibleRestoration {
        /// Member whose value was rejected.
        object_id: usize,
        /// Description of the incompatibility.
        message: String,
    },

    /// The output sink could not create a directory or open a target.
    SinkUnavailable {
        /// Name of the target or directory involved.
        target: String,
        /// Rendered IO error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyOrder => write!(f, "cluster order is empty"),
            Error::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "dimensionality mismatch: expected {expected}, found {found}"
                )
            }
            Error::MalformedOrder { message } => {
                write!(f, "malformed cluster order: {message}")
            }
            Error::IncompatibleRestoration { object_id, message } => {
                write!(f, "cannot restore value of object {object_id}: {message}")
            }
            Error::SinkUnavailable { target, message } => {
                write!(f, "output sink failed for '{target}': {message}")
            }
        }
    }
}

impl std::error::Error for Error {}
