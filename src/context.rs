//! Thin per-RPC context carriers.
//!
//! The host framework's real contexts are far richer; these hold exactly
//! what the codec façades consume and produce. A context belongs to one
//! in-flight RPC and must not be shared across concurrent calls.

use crate::{MessageHeader, Status};

/// Client-side per-RPC state.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    /// The function to invoke, possibly `Service:Method` qualified.
    pub function_name: String,

    /// The request id stamped into the sequence-id header field.
    pub request_id: u32,

    /// The RPC outcome as recorded by the codec.
    pub status: Status,
}

impl ClientContext {
    /// Constructs a context for one invocation of `function_name`.
    pub fn new(function_name: impl Into<String>, request_id: u32) -> Self {
        Self {
            function_name: function_name.into(),
            request_id,
            status: Status::ok(),
        }
    }
}

/// Server-side per-RPC state.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// The decoded request header, captured by the server codec's decode
    /// so the encode path can derive the reply header from it.
    pub request_header: MessageHeader,

    /// The RPC outcome; inspected by encode to decide between a reply and
    /// a synthesised exception.
    pub status: Status,

    /// Cleared when request decoding fails: a request that never parsed
    /// gets no reply.
    pub send_response: bool,
}

impl Default for ServerContext {
    fn default() -> Self {
        Self {
            request_header: MessageHeader::default(),
            status: Status::ok(),
            send_response: true,
        }
    }
}
