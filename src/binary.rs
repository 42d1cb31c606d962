//! Primitive read/write operations of the Thrift binary protocol.

use byteorder::{BigEndian, ByteOrder};
use tracing::error;

use crate::{BufferBuilder, Error, MessageHeader, NonContiguousBuffer, WireType};

/// Mask isolating the version bits of a strict message header.
pub const VERSION_MASK: i32 = 0xffff_0000_u32 as i32;

/// The version constant carried in a strict message header's high 16 bits.
pub const VERSION_1: i32 = 0x8001_0000_u32 as i32;

/// Values skipped past [`MAX_SKIP_DEPTH`] nesting levels abort with
/// [`Error::SkipDepthExceeded`] instead of exhausting the stack.
const MAX_SKIP_DEPTH: usize = 64;

/// A view over buffers that reads and writes Thrift binary values.
///
/// A `ThriftBuffer` operates in one of three modes depending on how it was
/// constructed: [`reading`](Self::reading) wraps a consumable
/// [`NonContiguousBuffer`], [`writing`](Self::writing) wraps a
/// [`BufferBuilder`], and [`duplex`](Self::duplex) wraps both. Invoking a
/// primitive the mode does not support fails with [`Error::NotReadable`] or
/// [`Error::NotWritable`].
///
/// All integers are big-endian on the wire. Reads return the decoded
/// value; writes and [`skip`](Self::skip) return the number of bytes
/// produced or consumed.
#[derive(Debug)]
pub struct ThriftBuffer<'a> {
    buffer: Option<&'a mut NonContiguousBuffer>,
    builder: Option<&'a mut BufferBuilder>,
}

impl<'a> ThriftBuffer<'a> {
    /// Constructs a read-only view over `buffer`.
    pub fn reading(buffer: &'a mut NonContiguousBuffer) -> Self {
        Self {
            buffer: Some(buffer),
            builder: None,
        }
    }

    /// Constructs a write-only view over `builder`.
    pub fn writing(builder: &'a mut BufferBuilder) -> Self {
        Self {
            buffer: None,
            builder: Some(builder),
        }
    }

    /// Constructs a bidirectional view reading from `buffer` and writing
    /// to `builder`.
    pub fn duplex(buffer: &'a mut NonContiguousBuffer, builder: &'a mut BufferBuilder) -> Self {
        Self {
            buffer: Some(buffer),
            builder: Some(builder),
        }
    }

    fn reader(&mut self) -> Result<&mut NonContiguousBuffer, Error> {
        self.buffer.as_deref_mut().ok_or(Error::NotReadable)
    }

    fn read_raw<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let buffer = self.reader()?;
        let mut raw = [0u8; N];
        buffer.flatten_to(&mut raw)?;
        buffer.skip(N)?;
        Ok(raw)
    }

    fn write_raw(&mut self, raw: &[u8]) -> Result<usize, Error> {
        let builder = self.builder.as_deref_mut().ok_or(Error::NotWritable)?;
        builder.append(raw);
        Ok(raw.len())
    }

    /// Reads a single byte.
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_raw::<1>()?[0] as i8)
    }

    /// Reads a big-endian i16.
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(BigEndian::read_i16(&self.read_raw::<2>()?))
    }

    /// Reads a big-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(BigEndian::read_i32(&self.read_raw::<4>()?))
    }

    /// Reads a big-endian i64.
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(BigEndian::read_i64(&self.read_raw::<8>()?))
    }

    /// Reads a big-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(BigEndian::read_u64(&self.read_raw::<8>()?))
    }

    /// Reads a double carried as its big-endian IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Writes a single byte.
    pub fn write_i8(&mut self, v: i8) -> Result<usize, Error> {
        self.write_raw(&[v as u8])
    }

    /// Writes a big-endian i16.
    pub fn write_i16(&mut self, v: i16) -> Result<usize, Error> {
        let mut raw = [0u8; 2];
        BigEndian::write_i16(&mut raw, v);
        self.write_raw(&raw)
    }

    /// Writes a big-endian i32.
    pub fn write_i32(&mut self, v: i32) -> Result<usize, Error> {
        let mut raw = [0u8; 4];
        BigEndian::write_i32(&mut raw, v);
        self.write_raw(&raw)
    }

    /// Writes a big-endian i64.
    pub fn write_i64(&mut self, v: i64) -> Result<usize, Error> {
        let mut raw = [0u8; 8];
        BigEndian::write_i64(&mut raw, v);
        self.write_raw(&raw)
    }

    /// Writes a big-endian u64.
    pub fn write_u64(&mut self, v: u64) -> Result<usize, Error> {
        let mut raw = [0u8; 8];
        BigEndian::write_u64(&mut raw, v);
        self.write_raw(&raw)
    }

    /// Writes a double as its big-endian IEEE-754 bit pattern.
    pub fn write_f64(&mut self, v: f64) -> Result<usize, Error> {
        self.write_u64(v.to_bits())
    }

    /// Reads a length-prefixed string.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_i32()?;
        self.read_string_body(len)
    }

    /// Reads the body of a string whose length prefix has already been
    /// consumed.
    pub fn read_string_body(&mut self, len: i32) -> Result<String, Error> {
        if len < 0 {
            error!(len, "negative string length");
            return Err(Error::MalformedString(len));
        }
        if len == 0 {
            return Ok(String::new());
        }

        // Bound the allocation by the bytes actually present.
        let len = len as usize;
        let buffer = self.reader()?;
        if len > buffer.byte_size() {
            return Err(Error::ShortBuffer {
                expected: len,
                available: buffer.byte_size(),
            });
        }

        let mut raw = vec![0u8; len];
        buffer.flatten_to(&mut raw)?;
        buffer.skip(len)?;

        Ok(String::from_utf8(raw)?)
    }

    /// Writes a length-prefixed string.
    pub fn write_string(&mut self, s: &str) -> Result<usize, Error> {
        let mut wsize = self.write_i32(s.len() as i32)?;
        wsize += self.write_raw(s.as_bytes())?;
        Ok(wsize)
    }

    /// Reads a field header, returning the wire type byte and field id.
    ///
    /// A [`WireType::Stop`] byte has no id on the wire; zero is reported.
    pub fn read_field_begin(&mut self) -> Result<(i8, i16), Error> {
        let field_type = self.read_i8()?;
        if field_type == WireType::Stop as i8 {
            return Ok((field_type, 0));
        }
        let field_id = self.read_i16()?;
        Ok((field_type, field_id))
    }

    /// Writes a field header.
    pub fn write_field_begin(&mut self, field_type: i8, field_id: i16) -> Result<usize, Error> {
        let mut wsize = self.write_i8(field_type)?;
        wsize += self.write_i16(field_id)?;
        Ok(wsize)
    }

    /// Writes the stop byte terminating a struct's field list.
    pub fn write_field_stop(&mut self) -> Result<usize, Error> {
        self.write_i8(WireType::Stop as i8)
    }

    /// Reads a message header into `header`, returning the bytes consumed.
    ///
    /// Both header forms are accepted. A negative first word selects the
    /// strict layout; its version bits are checked against [`VERSION_1`]
    /// but a mismatch is only logged, and decoding continues with whatever
    /// message type the low byte carries.
    pub fn read_message_begin(&mut self, header: &mut MessageHeader) -> Result<usize, Error> {
        let mut rsize = 0;
        let first = self.read_i32()?;
        rsize += 4;

        if first < 0 {
            let version = first & VERSION_MASK;
            if version != VERSION_1 {
                error!("bad message header version: expect {VERSION_1:#010x}, got {version:#010x}");
            }
            header.function_name = self.read_string()?;
            rsize += 4 + header.function_name.len();
            header.sequence_id = self.read_i32()?;
            rsize += 4;
            header.message_type = (first & 0xff) as i8;
            header.is_strict = true;
        } else {
            header.function_name = self.read_string_body(first)?;
            rsize += first as usize;
            header.message_type = self.read_i8()?;
            rsize += 1;
            header.sequence_id = self.read_i32()?;
            rsize += 4;
            header.is_strict = false;
        }

        Ok(rsize)
    }

    /// Writes the message header described by `header`, returning the
    /// bytes produced.
    ///
    /// `header.is_strict` selects between the strict layout (version word,
    /// name, sequence id) and the original layout (name, type byte,
    /// sequence id).
    pub fn write_message_begin(&mut self, header: &MessageHeader) -> Result<usize, Error> {
        let mut wsize = 0;

        if header.is_strict {
            let version = VERSION_1 | i32::from(header.message_type);
            wsize += self.write_i32(version)?;
            wsize += self.write_string(&header.function_name)?;
            wsize += self.write_i32(header.sequence_id)?;
        } else {
            wsize += self.write_string(&header.function_name)?;
            wsize += self.write_i8(header.message_type)?;
            wsize += self.write_i32(header.sequence_id)?;
        }

        Ok(wsize)
    }

    /// Advances past a value of the given wire type without materialising
    /// it, returning the total bytes consumed.
    ///
    /// Wire type codes this protocol does not define are a no-op.
    pub fn skip(&mut self, field_type: i8) -> Result<usize, Error> {
        self.skip_depth(field_type, 0)
    }

    fn skip_depth(&mut self, field_type: i8, depth: usize) -> Result<usize, Error> {
        if depth > MAX_SKIP_DEPTH {
            return Err(Error::SkipDepthExceeded);
        }

        match WireType::from_wire(field_type) {
            Some(WireType::Bool | WireType::I8) => {
                self.reader()?.skip(1)?;
                Ok(1)
            }
            Some(WireType::I16) => {
                self.reader()?.skip(2)?;
                Ok(2)
            }
            Some(WireType::I32) => {
                self.reader()?.skip(4)?;
                Ok(4)
            }
            Some(WireType::I64 | WireType::U64 | WireType::Double) => {
                self.reader()?.skip(8)?;
                Ok(8)
            }
            Some(WireType::String | WireType::Utf8 | WireType::Utf16) => {
                let len = self.read_i32()?;
                if len < 0 {
                    return Err(Error::MalformedString(len));
                }
                self.reader()?.skip(len as usize)?;
                Ok(4 + len as usize)
            }
            Some(WireType::Struct) => {
                let mut rsize = 0;
                loop {
                    let (field_type, _field_id) = self.read_field_begin()?;
                    if field_type == WireType::Stop as i8 {
                        rsize += 1;
                        break;
                    }
                    rsize += 3;
                    rsize += self.skip_depth(field_type, depth + 1)?;
                }
                Ok(rsize)
            }
            Some(WireType::Map) => {
                let key_type = self.read_i8()?;
                let val_type = self.read_i8()?;
                let count = self.read_i32()?;
                if count < 0 {
                    return Err(Error::InvalidLength(count));
                }
                let mut rsize = 6;
                for _ in 0..count {
                    rsize += self.skip_depth(key_type, depth + 1)?;
                    rsize += self.skip_depth(val_type, depth + 1)?;
                }
                Ok(rsize)
            }
            Some(WireType::List | WireType::Set) => {
                let val_type = self.read_i8()?;
                let count = self.read_i32()?;
                if count < 0 {
                    return Err(Error::InvalidLength(count));
                }
                let mut rsize = 5;
                for _ in 0..count {
                    rsize += self.skip_depth(val_type, depth + 1)?;
                }
                Ok(rsize)
            }
            Some(WireType::Stop | WireType::Void) | None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::MessageType;

    fn written(builder: &mut BufferBuilder) -> NonContiguousBuffer {
        builder.destructive_get()
    }

    #[test]
    fn test_primitive_wire_layout() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);

        assert_eq!(buf.write_i8(-2).unwrap(), 1);
        assert_eq!(buf.write_i16(-2).unwrap(), 2);
        assert_eq!(buf.write_i32(1).unwrap(), 4);
        assert_eq!(buf.write_i64(-2).unwrap(), 8);
        assert_eq!(buf.write_u64(3).unwrap(), 8);
        assert_eq!(buf.write_string("ab").unwrap(), 6);

        let out = written(&mut builder);
        assert_eq!(
            out.to_vec(),
            hex!(
                "fe"
                "fffe"
                "00000001"
                "fffffffffffffffe"
                "0000000000000003"
                "00000002 6162"
            )
        );
    }

    #[test]
    fn test_primitive_round_trip() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        buf.write_i8(i8::MIN).unwrap();
        buf.write_i16(i16::MIN).unwrap();
        buf.write_i32(i32::MIN).unwrap();
        buf.write_i64(i64::MIN).unwrap();
        buf.write_u64(u64::MAX).unwrap();
        buf.write_f64(-1234.5).unwrap();
        buf.write_string("round trip").unwrap();

        let mut out = written(&mut builder);
        let mut buf = ThriftBuffer::reading(&mut out);
        assert_eq!(buf.read_i8().unwrap(), i8::MIN);
        assert_eq!(buf.read_i16().unwrap(), i16::MIN);
        assert_eq!(buf.read_i32().unwrap(), i32::MIN);
        assert_eq!(buf.read_i64().unwrap(), i64::MIN);
        assert_eq!(buf.read_u64().unwrap(), u64::MAX);
        assert_eq!(buf.read_f64().unwrap(), -1234.5);
        assert_eq!(buf.read_string().unwrap(), "round trip");
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_on_write_only_buffer() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        assert_eq!(buf.read_i8(), Err(Error::NotReadable));
    }

    #[test]
    fn test_write_on_read_only_buffer() {
        let mut data = NonContiguousBuffer::from(&b"xx"[..]);
        let mut buf = ThriftBuffer::reading(&mut data);
        assert_eq!(buf.write_i8(0), Err(Error::NotWritable));
    }

    #[test]
    fn test_read_string_negative_length() {
        let mut data = NonContiguousBuffer::from(&hex!("ffffffff")[..]);
        let mut buf = ThriftBuffer::reading(&mut data);
        assert_eq!(buf.read_string(), Err(Error::MalformedString(-1)));
    }

    #[test]
    fn test_read_string_truncated_body() {
        let mut data = NonContiguousBuffer::from(&hex!("00000004 6162")[..]);
        let mut buf = ThriftBuffer::reading(&mut data);
        assert_eq!(
            buf.read_string(),
            Err(Error::ShortBuffer {
                expected: 4,
                available: 2,
            })
        );
    }

    #[test]
    fn test_field_begin_round_trip() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        assert_eq!(
            buf.write_field_begin(WireType::I32 as i8, 7).unwrap(),
            3
        );
        assert_eq!(buf.write_field_stop().unwrap(), 1);

        let mut out = written(&mut builder);
        assert_eq!(out.to_vec(), hex!("08 0007 00"));

        let mut buf = ThriftBuffer::reading(&mut out);
        assert_eq!(
            buf.read_field_begin().unwrap(),
            (WireType::I32 as i8, 7)
        );
        assert_eq!(buf.read_field_begin().unwrap(), (WireType::Stop as i8, 0));
    }

    #[test]
    fn test_message_begin_strict_round_trip() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);

        let header = MessageHeader {
            function_name: "Test".to_string(),
            message_type: MessageType::Call as i8,
            sequence_id: 930,
            ..Default::default()
        };
        assert!(header.is_strict);
        let wsize = buf.write_message_begin(&header).unwrap();

        let mut out = written(&mut builder);
        assert_eq!(
            out.to_vec(),
            hex!("80010001 00000004 54657374 000003a2")
        );

        let mut buf = ThriftBuffer::reading(&mut out);
        let mut got = MessageHeader {
            message_type: MessageType::Reply as i8,
            is_strict: false,
            ..Default::default()
        };
        let rsize = buf.read_message_begin(&mut got).unwrap();

        assert_eq!(rsize, wsize);
        assert_eq!(got.function_name, "Test");
        assert_eq!(got.message_type, MessageType::Call as i8);
        assert_eq!(got.sequence_id, 930);
        assert!(got.is_strict);
    }

    #[test]
    fn test_message_begin_non_strict_round_trip() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);

        let header = MessageHeader {
            function_name: "Test".to_string(),
            message_type: MessageType::Call as i8,
            sequence_id: 930,
            is_strict: false,
            ..Default::default()
        };
        let wsize = buf.write_message_begin(&header).unwrap();

        let mut out = written(&mut builder);
        assert_eq!(out.to_vec(), hex!("00000004 54657374 01 000003a2"));

        let mut buf = ThriftBuffer::reading(&mut out);
        let mut got = MessageHeader::default();
        let rsize = buf.read_message_begin(&mut got).unwrap();

        assert_eq!(rsize, wsize);
        assert_eq!(got.function_name, "Test");
        assert_eq!(got.message_type, MessageType::Call as i8);
        assert_eq!(got.sequence_id, 930);
        assert!(!got.is_strict);
    }

    #[test]
    fn test_message_begin_tolerates_bad_version() {
        // Version bits 0x8002 instead of 0x8001; the reader salvages the
        // message type from the low byte.
        let mut data = NonContiguousBuffer::from(
            &hex!("80020001 00000004 54657374 000003a2")[..],
        );
        let mut buf = ThriftBuffer::reading(&mut data);
        let mut got = MessageHeader::default();
        buf.read_message_begin(&mut got).unwrap();

        assert_eq!(got.function_name, "Test");
        assert_eq!(got.message_type, MessageType::Call as i8);
        assert_eq!(got.sequence_id, 930);
        assert!(got.is_strict);
    }

    #[test]
    fn test_skip_fixed_width() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        buf.write_i8(1).unwrap();
        buf.write_i16(2).unwrap();
        buf.write_i32(3).unwrap();
        buf.write_i64(4).unwrap();
        buf.write_f64(5.0).unwrap();

        let mut out = written(&mut builder);
        let mut buf = ThriftBuffer::reading(&mut out);
        assert_eq!(buf.skip(WireType::Bool as i8).unwrap(), 1);
        assert_eq!(buf.skip(WireType::I16 as i8).unwrap(), 2);
        assert_eq!(buf.skip(WireType::I32 as i8).unwrap(), 4);
        assert_eq!(buf.skip(WireType::I64 as i8).unwrap(), 8);
        assert_eq!(buf.skip(WireType::Double as i8).unwrap(), 8);
        assert!(out.is_empty());
    }

    #[test]
    fn test_skip_string_and_containers() {
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);

        // string
        buf.write_string("skipme").unwrap();
        // list<i32> of 3
        buf.write_i8(WireType::I32 as i8).unwrap();
        buf.write_i32(3).unwrap();
        for v in [1, 2, 3] {
            buf.write_i32(v).unwrap();
        }
        // map<i16, string> of 2
        buf.write_i8(WireType::I16 as i8).unwrap();
        buf.write_i8(WireType::String as i8).unwrap();
        buf.write_i32(2).unwrap();
        for (k, v) in [(1i16, "a"), (2, "bc")] {
            buf.write_i16(k).unwrap();
            buf.write_string(v).unwrap();
        }
        // trailing marker proving skips stopped at the right offsets
        buf.write_i8(0x55).unwrap();

        let mut out = written(&mut builder);
        let mut buf = ThriftBuffer::reading(&mut out);
        assert_eq!(buf.skip(WireType::String as i8).unwrap(), 10);
        assert_eq!(buf.skip(WireType::List as i8).unwrap(), 5 + 12);
        assert_eq!(buf.skip(WireType::Map as i8).unwrap(), 6 + 7 + 8);
        assert_eq!(buf.read_i8().unwrap(), 0x55);
        assert!(out.is_empty());
    }

    #[test]
    fn test_skip_unknown_type_is_noop() {
        let mut data = NonContiguousBuffer::from(&hex!("01020304")[..]);
        let mut buf = ThriftBuffer::reading(&mut data);
        assert_eq!(buf.skip(99).unwrap(), 0);
        assert_eq!(data.byte_size(), 4);
    }

    #[test]
    fn test_skip_depth_limit() {
        // A run of struct-typed field headers nesting one struct per level,
        // deeper than the skip engine permits.
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        for _ in 0..80 {
            buf.write_field_begin(WireType::Struct as i8, 1).unwrap();
        }

        let mut out = written(&mut builder);
        let mut buf = ThriftBuffer::reading(&mut out);
        assert_eq!(
            buf.skip(WireType::Struct as i8),
            Err(Error::SkipDepthExceeded)
        );
    }
}
