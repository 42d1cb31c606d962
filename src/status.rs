//! RPC status carried on the calling context, and the mappings between
//! framework return codes and Thrift exception types.

use crate::ExceptionType;

/// The framework-level return code classes the codec distinguishes.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameworkCode {
    /// The invocation succeeded.
    #[default]
    Success,

    /// The server failed to decode the request.
    ServerDecode,
    /// The server failed to encode the response.
    ServerEncode,
    /// The requested service is not registered.
    ServerNoService,
    /// The requested function is not registered.
    ServerNoFunc,
    /// The server-side invocation timed out.
    ServerTimeout,
    /// The full-link deadline expired on the server.
    ServerFullLinkTimeout,
    /// The server shed the request under overload.
    ServerOverload,
    /// The server rate-limited the request.
    ServerLimited,

    /// The client failed to encode the request.
    ClientEncode,
    /// The client failed to decode the response.
    ClientDecode,
    /// The client-side invocation timed out.
    ClientTimeout,
    /// The full-link deadline expired on the client.
    ClientFullLinkTimeout,
    /// The client could not connect to the peer.
    ClientConnect,
    /// The client could not route the request.
    ClientRouter,
    /// The client rate-limited the request.
    ClientLimited,
    /// The client shed the request under overload.
    ClientOverload,

    /// An unclassified failure.
    Unknown,
}

impl FrameworkCode {
    /// True for the code classes that surface to peers as
    /// [`ExceptionType::InternalError`].
    fn is_internal_error(self) -> bool {
        matches!(
            self,
            Self::ServerTimeout
                | Self::ServerFullLinkTimeout
                | Self::ServerOverload
                | Self::ServerLimited
                | Self::ClientTimeout
                | Self::ClientFullLinkTimeout
                | Self::ClientLimited
                | Self::ClientOverload
                | Self::ClientConnect
                | Self::ClientRouter
        )
    }

    /// Maps a Thrift exception type to the framework code class a caller
    /// should observe.
    pub fn from_exception_type(exception_type: ExceptionType) -> Self {
        match exception_type {
            ExceptionType::UnknownMethod => Self::ServerNoService,
            ExceptionType::InvalidMessageType
            | ExceptionType::BadSequenceId
            | ExceptionType::ProtocolError
            | ExceptionType::InvalidTransform
            | ExceptionType::InvalidProtocol => Self::ServerDecode,
            ExceptionType::WrongMethodName => Self::ServerNoFunc,
            ExceptionType::MissingResult => Self::ServerEncode,
            ExceptionType::UnsupportedClientType => Self::ClientConnect,
            _ => Self::Unknown,
        }
    }
}

impl ExceptionType {
    /// Maps a framework code class to the exception type a server reply
    /// should carry.
    pub fn from_framework_code(code: FrameworkCode) -> Self {
        match code {
            FrameworkCode::ServerDecode
            | FrameworkCode::ServerEncode
            | FrameworkCode::ClientEncode
            | FrameworkCode::ClientDecode => Self::ProtocolError,
            FrameworkCode::ServerNoService => Self::UnknownMethod,
            FrameworkCode::ServerNoFunc => Self::WrongMethodName,
            code if code.is_internal_error() => Self::InternalError,
            _ => Self::Unknown,
        }
    }
}

/// The outcome of an RPC as recorded on its context.
///
/// The codec never returns errors directly to the host framework: a
/// failing façade operation returns `false` and leaves the detail here.
/// `func_code` carries the function-level return value (or, on a client
/// observing an exception reply, the exception's `type`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Status {
    framework_code: FrameworkCode,
    func_code: i32,
    message: String,
}

impl Status {
    /// A successful status.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Constructs a status from a framework code, a function return code
    /// and an error message.
    pub fn new(framework_code: FrameworkCode, func_code: i32, message: impl Into<String>) -> Self {
        Self {
            framework_code,
            func_code,
            message: message.into(),
        }
    }

    /// True when both the framework and function codes indicate success.
    pub fn is_ok(&self) -> bool {
        self.framework_code == FrameworkCode::Success && self.func_code == 0
    }

    /// The framework code class.
    pub fn framework_code(&self) -> FrameworkCode {
        self.framework_code
    }

    /// The function-level return code.
    pub fn func_code(&self) -> i32 {
        self.func_code
    }

    /// The error message, empty on success.
    pub fn error_message(&self) -> &str {
        &self.message
    }
}
