//! The server-side codec façade.

use std::collections::VecDeque;

use tracing::error;

use crate::{
    check_frames, Error, ExceptionType, FrameworkCode, MessageHeader, MessageType,
    NonContiguousBuffer, PacketVerdict, RequestMessage, ResponseMessage, SerializationType,
    ServerContext, Status, ThriftException, ThriftSerialization,
};

/// Decodes requests and encodes responses on behalf of a server.
///
/// Every operation returns a success flag; on `false` the failure detail
/// is recorded on the context's [`Status`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThriftServerCodec {
    serialization: ThriftSerialization,
}

impl ThriftServerCodec {
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

    /// Decodes one whole frame into `request`, capturing the request
    /// header on the context for the encode path.
    ///
    /// On failure the context's reply flag is cleared: a request that
    /// never parsed gets no response at all.
    pub fn decode(
        &self,
        ctx: &mut ServerContext,
        frame: NonContiguousBuffer,
        request: &mut RequestMessage,
    ) -> bool {
        match request.decode(frame) {
            Ok(()) => {
                ctx.request_header = request.header.clone();
                true
            }
            Err(e) => {
                error!(error = %e, "thrift request decode failed");
                ctx.send_response = false;
                ctx.status = Status::new(FrameworkCode::ServerDecode, 0, e.to_string());
                false
            }
        }
    }

    /// Encodes `response` into a complete frame in `out`.
    ///
    /// The reply header is derived from the decoded request: the function
    /// name (demultiplexed past the last `:` when present) and the
    /// sequence id. A non-success status turns the reply into an
    /// exception message whose body replaces whatever the handler
    /// produced.
    pub fn encode(
        &self,
        ctx: &mut ServerContext,
        response: &mut ResponseMessage,
        out: &mut NonContiguousBuffer,
    ) -> bool {
        match self.encode_response(ctx, response) {
            Ok(frame) => {
                *out = frame;
                true
            }
            Err(e) => {
                error!(error = %e, "thrift response encode failed");
                ctx.status = Status::new(FrameworkCode::ServerEncode, 0, e.to_string());
                false
            }
        }
    }

    fn encode_response(
        &self,
        ctx: &ServerContext,
        response: &mut ResponseMessage,
    ) -> Result<NonContiguousBuffer, Error> {
        let mut header = MessageHeader::default();

        // A multiplexing client prepends the service name to the function
        // name; the response echoes the bare method name back.
        let func_name = &ctx.request_header.function_name;
        header.function_name = match func_name.rfind(':') {
            Some(at) => func_name[at + 1..].to_string(),
            None => func_name.clone(),
        };

        if ctx.status.is_ok() {
            header.message_type = MessageType::Reply as i8;
        } else {
            // The reply becomes an exception built from the status: the
            // framework code maps to a well-known exception type, a bare
            // function code passes through numerically.
            header.message_type = MessageType::Exception as i8;

            let kind = if ctx.status.framework_code() != FrameworkCode::Success {
                ExceptionType::from_framework_code(ctx.status.framework_code()) as i32
            } else {
                ctx.status.func_code()
            };
            let exception = ThriftException::new(kind, ctx.status.error_message());

            let mut body = NonContiguousBuffer::default();
            self.serialization
                .serialize(SerializationType::Thrift, &exception, &mut body)?;
            response.set_body(body);
        }

        header.sequence_id = ctx.request_header.sequence_id;
        response.header = header;

        response.encode()
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
