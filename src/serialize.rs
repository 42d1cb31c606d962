//! The serialisation adapter bridging the codec façades to the descriptor
//! system.
//!
//! This is the one place the RPC machinery touches Thrift specifics: any
//! IDL message moves through here as a `dyn` [`IdlMessage`], driven by the
//! descriptor it carries.

use crate::{BufferBuilder, Error, IdlMessage, NonContiguousBuffer, ThriftBuffer};

/// Identifies a body serialisation scheme.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializationType {
    /// Thrift binary, the only scheme this codec carries.
    #[default]
    Thrift,
}

/// Serialises and deserialises IDL messages through their descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThriftSerialization;

impl ThriftSerialization {
    /// Serialises `msg` into `out`, replacing its contents.
    pub fn serialize(
        &self,
        in_type: SerializationType,
        msg: &dyn IdlMessage,
        out: &mut NonContiguousBuffer,
    ) -> Result<(), Error> {
        if in_type != SerializationType::Thrift {
            return Err(Error::UnsupportedSerialization);
        }

        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        msg.write_to(&mut buf)?;
        *out = builder.destructive_get();

        Ok(())
    }

    /// Deserialises `input` into `msg`, consuming the bytes read.
    pub fn deserialize(
        &self,
        input: &mut NonContiguousBuffer,
        out_type: SerializationType,
        msg: &mut dyn IdlMessage,
    ) -> Result<(), Error> {
        if out_type != SerializationType::Thrift {
            return Err(Error::UnsupportedSerialization);
        }

        let mut buf = ThriftBuffer::reading(input);
        msg.read_from(&mut buf)?;

        Ok(())
    }
}
