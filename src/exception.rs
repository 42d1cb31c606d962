//! The well-known Thrift exception struct.
//!
//! Servers serialise one of these as the body of every
//! [`MessageType::Exception`] reply, and clients deserialise it to recover
//! the failure kind and text. The impls below are written the way the IDL
//! generator emits them for any user struct.
//!
//! [`MessageType::Exception`]: crate::MessageType::Exception

use crate::{
    read_struct, write_struct, Error, FieldRequiredness, StructElement, ThriftBuffer,
    ThriftStruct, ThriftType, WireType,
};

/// The exception payload: a human-readable message (field 1) and a numeric
/// `type` code (field 2, see [`ExceptionType`]).
///
/// [`ExceptionType`]: crate::ExceptionType
#[derive(Debug, Clone, PartialEq)]
pub struct ThriftException {
    /// The failure description.
    pub message: String,

    /// The failure class, carried on the wire as field `type`.
    pub kind: i32,

    /// Field presence flags.
    pub isset: ThriftExceptionIsset,
}

/// Presence flags for [`ThriftException`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ThriftExceptionIsset {
    /// Whether `message` is present.
    pub message: bool,

    /// Whether `kind` is present.
    pub kind: bool,
}

impl Default for ThriftException {
    fn default() -> Self {
        Self {
            message: String::new(),
            kind: 0,
            isset: ThriftExceptionIsset {
                message: true,
                kind: true,
            },
        }
    }
}

impl ThriftException {
    /// Constructs an exception with both fields present.
    pub fn new(kind: i32, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            ..Default::default()
        }
    }
}

impl ThriftStruct for ThriftException {
    fn elements() -> &'static [StructElement<Self>] {
        fn isset_message(m: &ThriftException) -> bool {
            m.isset.message
        }
        fn set_isset_message(m: &mut ThriftException) {
            m.isset.message = true;
        }
        fn read_message(buf: &mut ThriftBuffer<'_>, m: &mut ThriftException) -> Result<usize, Error> {
            ThriftType::read(buf, &mut m.message)
        }
        fn write_message(m: &ThriftException, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
            m.message.write(buf)
        }
        fn isset_kind(m: &ThriftException) -> bool {
            m.isset.kind
        }
        fn set_isset_kind(m: &mut ThriftException) {
            m.isset.kind = true;
        }
        fn read_kind(buf: &mut ThriftBuffer<'_>, m: &mut ThriftException) -> Result<usize, Error> {
            ThriftType::read(buf, &mut m.kind)
        }
        fn write_kind(m: &ThriftException, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
            m.kind.write(buf)
        }

        static ELEMENTS: [StructElement<ThriftException>; 2] = [
            StructElement {
                wire_type: WireType::String,
                name: "message",
                field_id: 1,
                required: FieldRequiredness::Default,
                isset: isset_message,
                set_isset: set_isset_message,
                read: read_message,
                write: write_message,
            },
            StructElement {
                wire_type: WireType::I32,
                name: "type",
                field_id: 2,
                required: FieldRequiredness::Default,
                isset: isset_kind,
                set_isset: set_isset_kind,
                read: read_kind,
                write: write_kind,
            },
        ];
        &ELEMENTS
    }
}

impl ThriftType for ThriftException {
    const WIRE_TYPE: WireType = WireType::Struct;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        read_struct(buf, out)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        write_struct(self, buf)
    }
}
