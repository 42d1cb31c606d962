use thiserror::Error;

/// Error types returned by this crate.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A read or skip needs more bytes than the buffer holds.
    ///
    /// Returned both for truncated wire data (a field declared longer than
    /// the remaining frame) and for caller errors such as cutting more bytes
    /// than a buffer contains.
    #[error("short buffer (need {expected} bytes, have {available})")]
    ShortBuffer {
        /// The number of bytes the operation needed.
        expected: usize,

        /// The number of bytes actually available.
        available: usize,
    },

    /// A string field carries a negative length prefix.
    ///
    /// This is a violation of the binary protocol and fails the current
    /// message; the connection framing is still intact.
    #[error("malformed string length {0}")]
    MalformedString(i32),

    /// A container (list, set or map) carries a negative element count.
    #[error("invalid container length {0}")]
    InvalidLength(i32),

    /// The frame length prefix is negative or exceeds the maximum frame
    /// size.
    ///
    /// This is fatal for the connection: the stream can no longer be
    /// re-synchronised and the caller must tear it down.
    #[error("frame size {size} out of bounds (maximum {max})")]
    FrameTooLarge {
        /// The length prefix read from the wire.
        size: i32,

        /// The configured maximum frame size.
        max: i32,
    },

    /// A skipped value nests deeper than the skip engine allows.
    ///
    /// Legitimate IDL types stay far below the limit; hitting it means the
    /// wire data is hostile or corrupt.
    #[error("skip recursion depth exceeded")]
    SkipDepthExceeded,

    /// A string field contains bytes that are not valid UTF-8.
    #[error("string field is not valid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A read primitive was invoked on a [`ThriftBuffer`] constructed
    /// without a read buffer.
    ///
    /// [`ThriftBuffer`]: crate::ThriftBuffer
    #[error("thrift buffer has no read buffer attached")]
    NotReadable,

    /// A write primitive was invoked on a [`ThriftBuffer`] constructed
    /// without a write builder.
    ///
    /// [`ThriftBuffer`]: crate::ThriftBuffer
    #[error("thrift buffer has no write builder attached")]
    NotWritable,

    /// The serialisation adapter was handed a type tag other than
    /// [`SerializationType::Thrift`].
    ///
    /// [`SerializationType::Thrift`]: crate::SerializationType::Thrift
    #[error("unsupported serialisation type")]
    UnsupportedSerialization,
}
