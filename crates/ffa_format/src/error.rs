//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// type tag does not start with a known element kind
    #[error("type[0] must be one of \"NIJRDCZASL\", found {0:?}")]
    #[diagnostic(help("the first character of a type tag selects the element kind"))]
    UnknownType(char),

    /// names and type tags are stored as raw ASCII bytes
    #[error("{0:?} is not an ASCII identifier")]
    InvalidName(String),

    /// only scalars, vectors and matrices can be stored
    #[error("array data with rank={0} is not allowed")]
    InvalidRank(usize),

    /// number of elements does not fit the requested shape
    #[error("{actual} elements cannot fill a {nsiz} x {ndim} block")]
    ShapeMismatch {
        /// requested rows
        nsiz: usize,
        /// requested columns
        ndim: usize,
        /// supplied elements
        actual: usize,
    },

    /// a negative count was found in a descriptor
    #[error("invalid count {0} in descriptor")]
    InvalidCount(i64),

    /// a value could not be converted to the new element kind
    #[error("unable to cast {value:?} to {kind}")]
    Cast {
        /// the offending value, as text
        value: String,
        /// the target element kind
        kind: crate::types::ElementKind,
    },

    /// descriptor line ended early
    #[error("missing field \"{0}\" in descriptor")]
    MissingField(&'static str),

    /// descriptor or data line carries more tokens than expected
    #[error("unexpected trailing field {0:?}")]
    TrailingField(String),

    /// numeric token could not be parsed
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    /// string is not ASCII, or cannot be quoted in text form
    #[error("invalid string {0:?}")]
    InvalidString(String),

    /// datasets nested past the supported depth
    #[error("datasets nested deeper than {0} levels")]
    TooDeep(usize),

    /// text input ended in the middle of a node
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// child index out of range
    #[error("no child at index {0}")]
    IndexOutOfRange(usize),

    /// the payload was skipped while reading and cannot be written back
    #[error("dataset {0:?} was read without its payload")]
    SkippedPayload(String),

    /// format version is not one of 0, 1 or 2
    #[error("version {0} is not applicable")]
    UnsupportedVersion(u8),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
