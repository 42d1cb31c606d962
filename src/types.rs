//! Wire-visible enumerations of the Thrift binary protocol.

/// The Thrift data-type codes used in field and container headers.
///
/// The numeric values are wire-visible and match the Thrift binary protocol
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum WireType {
    /// Terminates a struct's field list.
    Stop = 0,
    /// A void value (carries no bytes).
    Void = 1,
    /// A boolean, one byte, zero or non-zero.
    Bool = 2,
    /// A signed 8-bit integer.
    I8 = 3,
    /// A 64-bit IEEE-754 double, carried as its big-endian bit pattern.
    Double = 4,
    /// A signed 16-bit integer.
    I16 = 6,
    /// A signed 32-bit integer.
    I32 = 8,
    /// An unsigned 64-bit integer.
    U64 = 9,
    /// A signed 64-bit integer.
    I64 = 10,
    /// A length-prefixed string.
    String = 11,
    /// A struct: a field list terminated by [`WireType::Stop`].
    Struct = 12,
    /// A map: key type, value type, count, then count key/value pairs.
    Map = 13,
    /// A set: element type, count, then count elements.
    Set = 14,
    /// A list: element type, count, then count elements.
    List = 15,
    /// A UTF-8 string; identical wire layout to [`WireType::String`].
    Utf8 = 16,
    /// A UTF-16 string; identical wire layout to [`WireType::String`].
    Utf16 = 17,
}

impl WireType {
    /// Alias kept by the Thrift headers: a byte is an i8.
    pub const BYTE: Self = Self::I8;

    /// Alias kept by the Thrift headers: UTF-7 strings share the string
    /// code.
    pub const UTF7: Self = Self::String;

    /// Maps a raw wire byte back to a `WireType`, or `None` for codes this
    /// protocol does not define.
    pub fn from_wire(v: i8) -> Option<Self> {
        Some(match v {
            0 => Self::Stop,
            1 => Self::Void,
            2 => Self::Bool,
            3 => Self::I8,
            4 => Self::Double,
            6 => Self::I16,
            8 => Self::I32,
            9 => Self::U64,
            10 => Self::I64,
            11 => Self::String,
            12 => Self::Struct,
            13 => Self::Map,
            14 => Self::Set,
            15 => Self::List,
            16 => Self::Utf8,
            17 => Self::Utf16,
            _ => return None,
        })
    }
}

/// The kind of message an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum MessageType {
    /// An RPC invocation.
    Call = 1,
    /// A successful response.
    Reply = 2,
    /// A response carrying a [`ThriftException`] body.
    ///
    /// [`ThriftException`]: crate::ThriftException
    Exception = 3,
    /// An invocation that expects no response.
    Oneway = 4,
}

impl MessageType {
    /// Maps a raw wire byte back to a `MessageType`.
    pub fn from_wire(v: i8) -> Option<Self> {
        Some(match v {
            1 => Self::Call,
            2 => Self::Reply,
            3 => Self::Exception,
            4 => Self::Oneway,
            _ => return None,
        })
    }
}

/// The requiredness of a struct field, governing its isset-bit policy.
///
/// Fields marked [`FieldRequiredness::Optional`] are written only when
/// their isset bit is set; required and default fields are always written.
/// On read, every matched field except a required one records its presence
/// in the isset block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum FieldRequiredness {
    /// The field must always be present.
    Required = 0,
    /// The field is written only when its isset bit is set.
    Optional = 1,
    /// The field is always written; presence is still tracked on read.
    Default = 2,
}

/// The `type` codes carried by the well-known Thrift exception struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum ExceptionType {
    /// An unclassified failure.
    Unknown = 0,
    /// The named service is unknown to the server.
    UnknownMethod = 1,
    /// The message type byte is not a defined [`MessageType`].
    InvalidMessageType = 2,
    /// The named function is unknown to the service.
    WrongMethodName = 3,
    /// The sequence id does not match an outstanding request.
    BadSequenceId = 4,
    /// The reply is missing its result field.
    MissingResult = 5,
    /// The server failed internally (timeout, overload, routing).
    InternalError = 6,
    /// The message violated the binary protocol.
    ProtocolError = 7,
    /// The message used a transform the peer does not support.
    InvalidTransform = 8,
    /// The message used a protocol the peer does not support.
    InvalidProtocol = 9,
    /// The client type is not supported by the server.
    UnsupportedClientType = 10,
}

impl ExceptionType {
    /// Maps an exception `type` value back to an `ExceptionType`, or
    /// `None` for codes outside the defined range.
    pub fn from_wire(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::Unknown,
            1 => Self::UnknownMethod,
            2 => Self::InvalidMessageType,
            3 => Self::WrongMethodName,
            4 => Self::BadSequenceId,
            5 => Self::MissingResult,
            6 => Self::InternalError,
            7 => Self::ProtocolError,
            8 => Self::InvalidTransform,
            9 => Self::InvalidProtocol,
            10 => Self::UnsupportedClientType,
            _ => return None,
        })
    }
}
