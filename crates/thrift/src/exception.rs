//! Application exceptions reported by remote procedures.
//!
//! A server that fails to run a procedure for reasons outside the procedure's
//! declared exceptions (unknown method, internal error, ...) answers with an
//! `Exception` envelope holding a `TApplicationException`, whose schema is
//! embedded in [`crate::idl`].

use std::fmt;

use thiserror::Error;

use crate::error::FromWireError;
use crate::payload::FromWire;
use crate::wire::{Field, Struct, Type, Value};

/// Field ID of the message.
const MESSAGE_FIELD: i16 = 1;
/// Field ID of the exception type.
const TYPE_FIELD: i16 = 2;

/// Category of an application exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionType {
    /// Unclassified failure.
    Unknown,
    /// The method does not exist.
    UnknownMethod,
    /// The envelope kind was not valid for a request.
    InvalidMessageType,
    /// The reply named a different method.
    WrongMethodName,
    /// The reply had an unexpected sequence ID.
    BadSequenceId,
    /// The reply carried no result.
    MissingResult,
    /// The handler failed.
    InternalError,
    /// The request could not be decoded.
    ProtocolError,
    /// A transform was not valid.
    InvalidTransform,
    /// The protocol is not supported.
    InvalidProtocol,
    /// The client type is not supported.
    UnsupportedClientType,
    /// A value this client does not know.
    Other(i32),
}

impl From<i32> for ExceptionType {
    fn from(value: i32) -> Self {
        match value {
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
            other => Self::Other(other),
        }
    }
}

impl From<ExceptionType> for i32 {
    fn from(value: ExceptionType) -> Self {
        match value {
            ExceptionType::Unknown => 0,
            ExceptionType::UnknownMethod => 1,
            ExceptionType::InvalidMessageType => 2,
            ExceptionType::WrongMethodName => 3,
            ExceptionType::BadSequenceId => 4,
            ExceptionType::MissingResult => 5,
            ExceptionType::InternalError => 6,
            ExceptionType::ProtocolError => 7,
            ExceptionType::InvalidTransform => 8,
            ExceptionType::InvalidProtocol => 9,
            ExceptionType::UnsupportedClientType => 10,
            ExceptionType::Other(other) => other,
        }
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::UnknownMethod => "UNKNOWN_METHOD",
            Self::InvalidMessageType => "INVALID_MESSAGE_TYPE",
            Self::WrongMethodName => "WRONG_METHOD_NAME",
            Self::BadSequenceId => "BAD_SEQUENCE_ID",
            Self::MissingResult => "MISSING_RESULT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::InvalidTransform => "INVALID_TRANSFORM",
            Self::InvalidProtocol => "INVALID_PROTOCOL",
            Self::UnsupportedClientType => "UNSUPPORTED_CLIENT_TYPE",
            Self::Other(other) => return write!(f, "ExceptionType({other})"),
        };
        f.write_str(name)
    }
}

/// Decoded `TApplicationException`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationException {
    /// Human-readable description.
    pub message: Option<String>,
    /// Category.
    pub exception_type: Option<ExceptionType>,
}

impl ApplicationException {
    /// Create an exception with both fields set.
    pub fn new(message: impl Into<String>, exception_type: ExceptionType) -> Self {
        Self {
            message: Some(message.into()),
            exception_type: Some(exception_type),
        }
    }

    /// Encode as a wire value.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut fields = Vec::with_capacity(2);
        if let Some(message) = &self.message {
            fields.push(Field::new(MESSAGE_FIELD, Value::string(message.clone())));
        }
        if let Some(ty) = self.exception_type {
            fields.push(Field::new(TYPE_FIELD, Value::I32(ty.into())));
        }
        Value::Struct(Struct::new(fields))
    }
}

impl FromWire for ApplicationException {
    fn from_wire(value: &Value) -> Result<Self, FromWireError> {
        let Value::Struct(s) = value else {
            return Err(FromWireError::TypeMismatch {
                expected: Type::Struct,
                actual: value.ty(),
            });
        };

        let mut exc = Self::default();
        // Fields with an unknown ID or an unexpected type are skipped.
        for field in &s.fields {
            match (field.id, &field.value) {
                (MESSAGE_FIELD, Value::Binary(bytes)) => {
                    let message = String::from_utf8(bytes.to_vec())
                        .map_err(|_| FromWireError::InvalidUtf8("message"))?;
                    exc.message = Some(message);
                }
                (TYPE_FIELD, Value::I32(ty)) => exc.exception_type = Some((*ty).into()),
                _ => {}
            }
        }
        Ok(exc)
    }
}

impl fmt::Display for ApplicationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TApplicationException{")?;
        let mut sep = "";
        if let Some(message) = &self.message {
            write!(f, "Message: {message}")?;
            sep = ", ";
        }
        if let Some(ty) = self.exception_type {
            write!(f, "{sep}Type: {ty}")?;
        }
        f.write_str("}")
    }
}

/// A remote procedure ran and reported an application exception.
///
/// Distinct from every transport failure: the request was delivered and
/// answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "thrift request to procedure {procedure:?} of service {service:?} encountered an internal failure: {reason}"
)]
pub struct ThriftException {
    /// Transport-level service that answered.
    pub service: String,
    /// Procedure that was called.
    pub procedure: String,
    /// The decoded exception.
    pub reason: ApplicationException,
}
