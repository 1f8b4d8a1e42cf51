//! Error types for the Thrift client.
//!
//! Every failure a call can produce belongs to exactly one of the variants of
//! [`Error`], so callers can tell a rejected request apart from a transport
//! failure, a malformed response, and a remote procedure that ran but failed.

use std::error::Error as StdError;
use std::fmt;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::exception::ThriftException;
use crate::transport::Request;
use crate::wire::{EnvelopeKind, Type};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used at the payload and transport boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Main error type for client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied a request that cannot be sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A valid request could not be encoded.
    #[error(transparent)]
    RequestEncode(#[from] RequestEncodeError),

    /// The transport failed; passed through untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be interpreted.
    #[error(transparent)]
    ResponseDecode(#[from] ResponseDecodeError),

    /// The remote procedure ran and reported an application exception.
    #[error(transparent)]
    Application(#[from] ThriftException),

    /// The client was misconfigured.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Requests rejected before anything reached the wire.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The payload asked for an envelope kind a client cannot send.
    #[error("unexpected envelope type {kind} for request {method:?}: only Call and OneWay may be sent")]
    UnexpectedEnvelopeKind {
        /// Method name reported by the payload.
        method: String,
        /// Kind reported by the payload.
        kind: EnvelopeKind,
    },

    /// The payload failed to serialize itself; its error is shown as-is.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Error returned by a payload's own serialization.
///
/// Usually means the caller supplied invalid arguments, such as a missing
/// required field.
pub struct PayloadError(BoxError);

impl PayloadError {
    /// Wrap any error.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// Borrow the wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// Unwrap into the boxed error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl fmt::Debug for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for PayloadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Opaque error produced by a transport.
///
/// The client never inspects or rewraps it; `Display` and `source` are the
/// transport's own.
pub struct TransportError(BoxError);

impl TransportError {
    /// Wrap any error.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// Borrow the wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// Attempt to downcast the wrapped error.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Unwrap into the boxed error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

/// A valid envelope failed to encode.
#[derive(Debug, Error)]
#[error(
    "failed to encode {:?} request body for procedure {:?} of service {:?} from caller {:?}: {source}",
    .request.encoding, .request.procedure, .request.service, .request.caller
)]
pub struct RequestEncodeError {
    /// The request as built so far; its body is empty.
    pub request: Box<Request>,
    /// The codec failure.
    pub source: ProtocolError,
}

/// A response could not be turned into a result.
#[derive(Debug, Error)]
#[error(
    "failed to decode {:?} response body for procedure {:?} of service {:?} from caller {:?}: {source}",
    .request.encoding, .request.procedure, .request.service, .request.caller
)]
pub struct ResponseDecodeError {
    /// The request that produced the response.
    pub request: Box<Request>,
    /// What went wrong.
    pub source: DecodeFailure,
}

/// Reasons a response body is rejected.
#[derive(Debug, Error)]
pub enum DecodeFailure {
    /// The bytes were not a valid envelope.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The envelope was neither a reply nor an exception.
    #[error("unexpected envelope type: {0}")]
    UnexpectedEnvelopeKind(EnvelopeKind),

    /// The exception envelope did not hold an application exception.
    #[error("invalid application exception: {0}")]
    Exception(#[from] FromWireError),
}

/// Codec-level errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input ended before a value was complete.
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes needed.
        needed: usize,
        /// Bytes left.
        remaining: usize,
    },

    /// Unknown type code.
    #[error("Unknown type code: {0:#x}")]
    UnknownType(u8),

    /// Unknown envelope kind.
    #[error("Unknown envelope type: {0}")]
    UnknownEnvelopeKind(u8),

    /// Boolean byte other than 0 or 1.
    #[error("Invalid bool value: {0:#x}")]
    InvalidBool(u8),

    /// Strict envelope header with an unsupported version.
    #[error("Unsupported protocol version: {0:#010x}")]
    BadVersion(u32),

    /// Negative length or element count.
    #[error("Negative {what} size: {size}")]
    NegativeSize {
        /// What was being sized.
        what: &'static str,
        /// The size read.
        size: i32,
    },

    /// Length or count too large to encode.
    #[error("{what} size {size} exceeds the maximum of {max}")]
    TooLarge {
        /// What was being sized.
        what: &'static str,
        /// The size requested.
        size: usize,
        /// The limit.
        max: usize,
    },

    /// Collection element that does not match the declared type.
    #[error("Collection declared {declared} items but contains {actual}")]
    ItemTypeMismatch {
        /// Declared element type.
        declared: Type,
        /// Type found.
        actual: Type,
    },

    /// A value had the wrong type for its position.
    #[error("Expected {expected}, got {actual}")]
    TypeMismatch {
        /// Required type.
        expected: Type,
        /// Type found.
        actual: Type,
    },

    /// Envelope name was not UTF-8.
    #[error("Envelope name is not valid UTF-8: {0}")]
    InvalidName(#[from] FromUtf8Error),

    /// Values nested too deeply.
    #[error("Value nesting exceeds {0} levels")]
    TooDeep(usize),

    /// Failure raised by a custom protocol.
    #[error("{0}")]
    Other(String),
}

/// Errors converting a [`Value`](crate::wire::Value) into a typed value.
#[derive(Debug, Error)]
pub enum FromWireError {
    /// The value had the wrong shape.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// Required type.
        expected: Type,
        /// Type found.
        actual: Type,
    },

    /// A string field held invalid UTF-8.
    #[error("field {0:?} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// A required field was absent.
    #[error("missing required field {0:?}")]
    MissingField(&'static str),
}

/// Construction and wiring errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The Thrift service name was empty.
    #[error("Thrift service name must not be empty")]
    EmptyServiceName,

    /// The transport configuration lacks the outbound a call needs.
    #[error("No {kind} outbound configured for service {service:?}")]
    MissingOutbound {
        /// `"unary"` or `"oneway"`.
        kind: &'static str,
        /// Transport-level service name.
        service: String,
    },
}
