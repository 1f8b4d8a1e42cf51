//! Wire-level value model shared by every protocol.
//!
//! A [`Value`] is the untyped tree that generated payload types serialize
//! into and deserialize from. Protocols only ever see values and envelopes,
//! never the generated types themselves.

use std::fmt;

use bytes::Bytes;

use crate::error::ProtocolError;

/// Sequence ID written into every outbound envelope.
///
/// Replies are matched to calls by the transport, so this is never used to
/// correlate concurrent requests.
pub const SEQ_ID: i32 = 1;

/// Thrift type codes as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Type {
    /// Boolean.
    Bool = 2,
    /// Signed 8-bit integer.
    I8 = 3,
    /// 64-bit float.
    Double = 4,
    /// Signed 16-bit integer.
    I16 = 6,
    /// Signed 32-bit integer.
    I32 = 8,
    /// Signed 64-bit integer.
    I64 = 10,
    /// Length-prefixed bytes (strings and binary).
    Binary = 11,
    /// Struct, union or exception.
    Struct = 12,
    /// Map.
    Map = 13,
    /// Set.
    Set = 14,
    /// List.
    List = 15,
}

impl TryFrom<u8> for Type {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        match value {
            2 => Ok(Self::Bool),
            3 => Ok(Self::I8),
            4 => Ok(Self::Double),
            6 => Ok(Self::I16),
            8 => Ok(Self::I32),
            10 => Ok(Self::I64),
            11 => Ok(Self::Binary),
            12 => Ok(Self::Struct),
            13 => Ok(Self::Map),
            14 => Ok(Self::Set),
            15 => Ok(Self::List),
            _ => Err(ProtocolError::UnknownType(value)),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "TBool",
            Self::I8 => "TI8",
            Self::Double => "TDouble",
            Self::I16 => "TI16",
            Self::I32 => "TI32",
            Self::I64 => "TI64",
            Self::Binary => "TBinary",
            Self::Struct => "TStruct",
            Self::Map => "TMap",
            Self::Set => "TSet",
            Self::List => "TList",
        };
        f.write_str(name)
    }
}

/// A single Thrift value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed 8-bit integer.
    I8(i8),
    /// 64-bit float.
    Double(f64),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Strings and raw bytes.
    Binary(Bytes),
    /// Struct, union or exception.
    Struct(Struct),
    /// Map.
    Map(MapItems),
    /// Set.
    Set(ValueList),
    /// List.
    List(ValueList),
}

impl Value {
    /// Wire type of this value.
    #[must_use]
    pub const fn ty(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::I8(_) => Type::I8,
            Self::Double(_) => Type::Double,
            Self::I16(_) => Type::I16,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::Binary(_) => Type::Binary,
            Self::Struct(_) => Type::Struct,
            Self::Map(_) => Type::Map,
            Self::Set(_) => Type::Set,
            Self::List(_) => Type::List,
        }
    }

    /// Convenience constructor for string values.
    pub fn string(s: impl Into<String>) -> Self {
        Self::Binary(Bytes::from(s.into()))
    }

    /// Returns the struct if this value is one.
    #[must_use]
    pub const fn as_struct(&self) -> Option<&Struct> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered collection of struct fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    /// Fields in wire order.
    pub fields: Vec<Field>,
}

impl Struct {
    /// Create a struct from its fields.
    #[must_use]
    pub const fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// First field carrying the given ID.
    #[must_use]
    pub fn field(&self, id: i16) -> Option<&Value> {
        self.fields.iter().find(|f| f.id == id).map(|f| &f.value)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Self::Struct(s)
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field ID from the IDL.
    pub id: i16,
    /// Field value.
    pub value: Value,
}

impl Field {
    /// Create a field.
    #[must_use]
    pub const fn new(id: i16, value: Value) -> Self {
        Self { id, value }
    }
}

/// Homogeneous items of a list or set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    /// Declared element type.
    pub value_type: Type,
    /// Elements.
    pub items: Vec<Value>,
}

/// Key/value pairs of a map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapItems {
    /// Declared key type.
    pub key_type: Type,
    /// Declared value type.
    pub value_type: Type,
    /// Entries in wire order.
    pub items: Vec<(Value, Value)>,
}

/// Kind of message carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EnvelopeKind {
    /// Request expecting a reply.
    Call = 1,
    /// Successful (or declared-exception) reply.
    Reply = 2,
    /// Unexpected failure reported by the server.
    Exception = 3,
    /// Request with no reply.
    OneWay = 4,
}

impl EnvelopeKind {
    /// Whether a client may send an envelope of this kind.
    #[must_use]
    pub const fn is_outbound(self) -> bool {
        matches!(self, Self::Call | Self::OneWay)
    }
}

impl TryFrom<u8> for EnvelopeKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(Self::Call),
            2 => Ok(Self::Reply),
            3 => Ok(Self::Exception),
            4 => Ok(Self::OneWay),
            _ => Err(ProtocolError::UnknownEnvelopeKind(value)),
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Call => "Call",
            Self::Reply => "Reply",
            Self::Exception => "Exception",
            Self::OneWay => "OneWay",
        };
        f.write_str(name)
    }
}

/// Message header wrapped around a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Method name, possibly prefixed with a service for multiplexing.
    pub name: String,
    /// Message kind.
    pub kind: EnvelopeKind,
    /// Sequence ID.
    pub seq_id: i32,
    /// Payload, always a struct in practice.
    pub value: Value,
}

impl Envelope {
    /// Create an envelope with the fixed [`SEQ_ID`].
    pub fn new(name: impl Into<String>, kind: EnvelopeKind, value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            seq_id: SEQ_ID,
            value,
        }
    }
}
