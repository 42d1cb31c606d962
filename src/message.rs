//! Request and response message envelopes.
//!
//! Both envelopes share the same wire shape: a length prefix, a message
//! header, and an opaque struct body. The body stays opaque here and is
//! (de)serialised separately through the descriptor system, which keeps
//! the envelope code independent of any particular IDL.

use crate::{BufferBuilder, Error, MessageType, NonContiguousBuffer, ThriftBuffer, WireType};

/// The decoded fields of a message header, plus the frame size.
///
/// `frame_size` counts every byte that follows the 4-byte length prefix
/// through the end of the frame. Encoding establishes it from the bytes
/// actually produced; decoding populates it from the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    /// Byte count of the frame after the length prefix.
    pub frame_size: i32,

    /// The function being invoked, possibly `Service:Method` qualified.
    pub function_name: String,

    /// The [`MessageType`] byte.
    pub message_type: i8,

    /// Correlates a response with its request. Carried verbatim; the codec
    /// neither assigns nor validates it.
    pub sequence_id: i32,

    /// Whether the header uses the strict (versioned) layout. Writers
    /// default to strict; readers report whichever form arrived.
    pub is_strict: bool,
}

impl MessageHeader {
    /// The length prefix is a 4-byte big-endian signed integer.
    pub const PREFIX_LEN: usize = 4;

    /// Frames larger than 256 MiB are rejected as corrupt.
    pub const MAX_FRAME_SIZE: i32 = 256 * 1024 * 1024;
}

impl Default for MessageHeader {
    fn default() -> Self {
        Self {
            frame_size: 0,
            function_name: String::new(),
            message_type: MessageType::Call as i8,
            sequence_id: 0,
            is_strict: true,
        }
    }
}

/// Writes `[prefix][message begin][field begin][body][stop]`, deriving the
/// frame size from the bytes produced after the prefix.
fn encode_message(
    header: &mut MessageHeader,
    body: NonContiguousBuffer,
) -> Result<NonContiguousBuffer, Error> {
    let mut payload = BufferBuilder::default();
    let mut buf = ThriftBuffer::writing(&mut payload);
    buf.write_message_begin(header)?;
    // The struct body travels as a single struct-typed field with id 0.
    buf.write_field_begin(WireType::Struct as i8, 0)?;
    payload.append_buffer(body);
    let mut buf = ThriftBuffer::writing(&mut payload);
    buf.write_field_stop()?;

    let inner = payload.destructive_get();
    header.frame_size = inner.byte_size() as i32;

    let mut framed = BufferBuilder::default();
    let mut buf = ThriftBuffer::writing(&mut framed);
    buf.write_i32(header.frame_size)?;
    framed.append_buffer(inner);

    Ok(framed.destructive_get())
}

/// Reads the prefix and message header out of `frame`; the remainder is
/// the opaque struct body, returned with ownership.
fn decode_message(
    header: &mut MessageHeader,
    mut frame: NonContiguousBuffer,
) -> Result<NonContiguousBuffer, Error> {
    let mut buf = ThriftBuffer::reading(&mut frame);
    header.frame_size = buf.read_i32()?;
    buf.read_message_begin(header)?;
    Ok(frame)
}

/// The protocol object for an RPC invocation.
#[derive(Debug, Default)]
pub struct RequestMessage {
    /// The message header, written by encode and populated by decode.
    pub header: MessageHeader,

    /// The serialised struct body, owned by this message.
    pub body: NonContiguousBuffer,
}

impl RequestMessage {
    /// Encodes this request into a complete frame, consuming the body.
    pub fn encode(&mut self) -> Result<NonContiguousBuffer, Error> {
        let body = std::mem::take(&mut self.body);
        encode_message(&mut self.header, body)
    }

    /// Decodes a complete frame (as emitted by the frame checker) into
    /// this request, taking ownership of the body bytes.
    pub fn decode(&mut self, frame: NonContiguousBuffer) -> Result<(), Error> {
        self.body = decode_message(&mut self.header, frame)?;
        Ok(())
    }

    /// The request id carried in the sequence-id header field.
    pub fn request_id(&self) -> u32 {
        self.header.sequence_id as u32
    }

    /// Stamps the sequence-id header field.
    pub fn set_request_id(&mut self, id: u32) {
        self.header.sequence_id = id as i32;
    }

    /// The function name carried in the header.
    pub fn func_name(&self) -> &str {
        &self.header.function_name
    }

    /// Replaces the function name carried in the header.
    pub fn set_func_name(&mut self, name: impl Into<String>) {
        self.header.function_name = name.into();
    }

    /// Removes and returns the struct body.
    pub fn take_body(&mut self) -> NonContiguousBuffer {
        std::mem::take(&mut self.body)
    }

    /// Replaces the struct body.
    pub fn set_body(&mut self, body: NonContiguousBuffer) {
        self.body = body;
    }

    /// The total message size recorded in the header.
    pub fn message_size(&self) -> u32 {
        self.header.frame_size as u32
    }
}

/// The protocol object for an RPC response.
#[derive(Debug, Default)]
pub struct ResponseMessage {
    /// The message header, written by encode and populated by decode.
    pub header: MessageHeader,

    /// The serialised struct body, owned by this message.
    pub body: NonContiguousBuffer,
}

impl ResponseMessage {
    /// Encodes this response into a complete frame, consuming the body.
    pub fn encode(&mut self) -> Result<NonContiguousBuffer, Error> {
        let body = std::mem::take(&mut self.body);
        encode_message(&mut self.header, body)
    }

    /// Decodes a complete frame into this response, taking ownership of
    /// the body bytes.
    pub fn decode(&mut self, frame: NonContiguousBuffer) -> Result<(), Error> {
        self.body = decode_message(&mut self.header, frame)?;
        Ok(())
    }

    /// The request id carried in the sequence-id header field.
    pub fn request_id(&self) -> u32 {
        self.header.sequence_id as u32
    }

    /// Stamps the sequence-id header field.
    pub fn set_request_id(&mut self, id: u32) {
        self.header.sequence_id = id as i32;
    }

    /// The function name carried in the header.
    pub fn func_name(&self) -> &str {
        &self.header.function_name
    }

    /// Replaces the function name carried in the header.
    pub fn set_func_name(&mut self, name: impl Into<String>) {
        self.header.function_name = name.into();
    }

    /// Removes and returns the struct body.
    pub fn take_body(&mut self) -> NonContiguousBuffer {
        std::mem::take(&mut self.body)
    }

    /// Replaces the struct body.
    pub fn set_body(&mut self, body: NonContiguousBuffer) {
        self.body = body;
    }

    /// The total message size recorded in the header.
    pub fn message_size(&self) -> u32 {
        self.header.frame_size as u32
    }
}
