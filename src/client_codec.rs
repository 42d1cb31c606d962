//! The client-side codec façade.

use std::collections::VecDeque;

use tracing::error;

use crate::{
    check_frames, ClientContext, FrameworkCode, IdlMessage, MessageType, NonContiguousBuffer,
    PacketVerdict, RequestMessage, ResponseMessage, SerializationType, Status, ThriftException,
    ThriftSerialization,
};

/// Encodes requests and decodes responses on behalf of a client.
///
/// Every operation returns a success flag; on `false` the failure detail
/// is recorded on the context's [`Status`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThriftClientCodec {
    serialization: ThriftSerialization,
}

impl ThriftClientCodec {
    /// The codec's registered name.
    pub fn name(&self) -> &'static str {
        "thrift"
    }

    /// Splits bytes received from the connection into whole frames.
    pub fn check(
        &self,
        input: &mut NonContiguousBuffer,
        out: &mut VecDeque<NonContiguousBuffer>,
    ) -> PacketVerdict {
        check_frames(input, out)
    }

    /// Encodes `request` into a complete frame in `out`, stamping the
    /// header from the context: message type call, the context's function
    /// name and request id.
    pub fn encode(
        &self,
        ctx: &mut ClientContext,
        request: &mut RequestMessage,
        out: &mut NonContiguousBuffer,
    ) -> bool {
        request.header.function_name = ctx.function_name.clone();
        request.header.message_type = MessageType::Call as i8;
        request.set_request_id(ctx.request_id);

        match request.encode() {
            Ok(frame) => {
                *out = frame;
                true
            }
            Err(e) => {
                error!(error = %e, "thrift request encode failed");
                ctx.status = Status::new(FrameworkCode::ClientEncode, 0, e.to_string());
                false
            }
        }
    }

    /// Decodes one whole frame (as emitted by [`check`](Self::check)) into
    /// `response`.
    pub fn decode(
        &self,
        ctx: &mut ClientContext,
        frame: NonContiguousBuffer,
        response: &mut ResponseMessage,
    ) -> bool {
        match response.decode(frame) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "thrift response decode failed");
                ctx.status = Status::new(FrameworkCode::ClientDecode, 0, e.to_string());
                false
            }
        }
    }

    /// Serialises `body` into the request's struct body.
    pub fn fill_request(
        &self,
        ctx: &mut ClientContext,
        request: &mut RequestMessage,
        body: &dyn IdlMessage,
    ) -> bool {
        let mut buffer = NonContiguousBuffer::default();
        match self
            .serialization
            .serialize(SerializationType::Thrift, body, &mut buffer)
        {
            Ok(()) => {
                request.set_body(buffer);
                true
            }
            Err(e) => {
                error!(error = %e, "thrift request body serialisation failed");
                ctx.status = Status::new(FrameworkCode::ClientEncode, 0, e.to_string());
                false
            }
        }
    }

    /// Deserialises the response's struct body into `body`.
    ///
    /// An exception reply never fills `body`: its [`ThriftException`]
    /// payload is decoded instead and surfaced through the context's
    /// status, carrying the exception's `type` and message.
    pub fn fill_response(
        &self,
        ctx: &mut ClientContext,
        response: &mut ResponseMessage,
        body: &mut dyn IdlMessage,
    ) -> bool {
        let mut data = response.take_body();

        if response.header.message_type == MessageType::Exception as i8 {
            let mut exception = ThriftException::default();
            match self
                .serialization
                .deserialize(&mut data, SerializationType::Thrift, &mut exception)
            {
                Ok(()) => {
                    ctx.status = Status::new(
                        FrameworkCode::ClientDecode,
                        exception.kind,
                        exception.message,
                    );
                }
                Err(e) => {
                    error!(error = %e, "thrift exception body decode failed");
                    ctx.status = Status::new(FrameworkCode::ClientDecode, 0, e.to_string());
                }
            }
            return false;
        }

        match self
            .serialization
            .deserialize(&mut data, SerializationType::Thrift, body)
        {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "thrift response body decode failed");
                ctx.status = Status::new(FrameworkCode::ClientDecode, 0, e.to_string());
                false
            }
        }
    }

    /// Creates an empty request protocol object.
    pub fn create_request_object() -> RequestMessage {
        RequestMessage::default()
    }

    /// Creates an empty response protocol object.
    pub fn create_response_object() -> ResponseMessage {
        ResponseMessage::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BufferBuilder, ExceptionType, ThriftBuffer};

    #[test]
    fn test_codec_name() {
        assert_eq!(ThriftClientCodec::default().name(), "thrift");
    }

    #[test]
    fn test_encode_stamps_header_from_context() {
        let codec = ThriftClientCodec::default();
        let mut ctx = ClientContext::new("Echo", 77);
        let mut request = ThriftClientCodec::create_request_object();

        let mut wire = NonContiguousBuffer::default();
        assert!(codec.encode(&mut ctx, &mut request, &mut wire));
        assert!(ctx.status.is_ok());

        let mut decoded = RequestMessage::default();
        decoded.decode(wire).unwrap();
        assert_eq!(decoded.func_name(), "Echo");
        assert_eq!(decoded.request_id(), 77);
        assert_eq!(decoded.header.message_type, MessageType::Call as i8);
    }

    #[test]
    fn test_fill_request_then_fill_response_round_trip() {
        let codec = ThriftClientCodec::default();
        let mut ctx = ClientContext::new("Echo", 1);

        // Any IDL struct works as a payload; the exception struct is the
        // one this crate ships.
        let args = ThriftException::new(0, "payload");
        let mut request = ThriftClientCodec::create_request_object();
        assert!(codec.fill_request(&mut ctx, &mut request, &args));

        // Pretend the peer echoed the body back in a reply.
        let mut response = ThriftClientCodec::create_response_object();
        response.header.message_type = MessageType::Reply as i8;
        response.set_body(request.take_body());

        let mut result = ThriftException::default();
        assert!(codec.fill_response(&mut ctx, &mut response, &mut result));
        assert!(ctx.status.is_ok());
        assert_eq!(result.message, "payload");
    }

    #[test]
    fn test_fill_response_surfaces_exception_reply() {
        let codec = ThriftClientCodec::default();
        let mut ctx = ClientContext::new("Echo", 1);

        let exception =
            ThriftException::new(ExceptionType::WrongMethodName as i32, "no such method");
        let mut body = NonContiguousBuffer::default();
        ThriftSerialization
            .serialize(SerializationType::Thrift, &exception, &mut body)
            .unwrap();

        let mut response = ThriftClientCodec::create_response_object();
        response.header.message_type = MessageType::Exception as i8;
        response.set_body(body);

        let mut result = ThriftException::default();
        assert!(!codec.fill_response(&mut ctx, &mut response, &mut result));

        assert_eq!(ctx.status.framework_code(), FrameworkCode::ClientDecode);
        assert_eq!(ctx.status.func_code(), ExceptionType::WrongMethodName as i32);
        assert_eq!(ctx.status.error_message(), "no such method");
    }

    #[test]
    fn test_decode_failure_sets_status() {
        let codec = ThriftClientCodec::default();
        let mut ctx = ClientContext::new("Echo", 1);

        // A frame truncated inside the message header.
        let mut builder = BufferBuilder::default();
        let mut buf = ThriftBuffer::writing(&mut builder);
        buf.write_i32(64).unwrap();
        buf.write_i32(crate::VERSION_1 | 1).unwrap();

        let mut response = ThriftClientCodec::create_response_object();
        assert!(!codec.decode(&mut ctx, builder.destructive_get(), &mut response));
        assert_eq!(ctx.status.framework_code(), FrameworkCode::ClientDecode);
        assert!(!ctx.status.is_ok());
    }
}
