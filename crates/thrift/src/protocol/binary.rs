//! Thrift binary protocol.
//!
//! Envelopes are always written in the strict format (version word followed
//! by name and sequence ID). Both strict and legacy non-strict envelopes are
//! accepted when reading.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::Protocol;
use crate::error::ProtocolError;
use crate::wire::{Envelope, EnvelopeKind, Field, MapItems, Struct, Type, Value, ValueList};

/// Version word of strict envelopes; the low byte carries the envelope kind.
pub const VERSION_1: u32 = 0x8001_0000;

const VERSION_MASK: u32 = 0xffff_0000;
const TYPE_MASK: u32 = 0x0000_00ff;
const STRICT_BIT: u32 = 0x8000_0000;
const FIELD_STOP: u8 = 0;

/// Maximum nesting of containers accepted while decoding.
pub const MAX_DEPTH: usize = 64;

/// The Thrift binary protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Binary;

impl Protocol for Binary {
    fn encode(&self, value: &Value, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        write_value(value, buf)
    }

    fn decode(&self, data: &[u8], ty: Type) -> Result<Value, ProtocolError> {
        Reader::new(data).read_value(ty, 0)
    }

    fn encode_enveloped(&self, envelope: Envelope, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        buf.put_u32(VERSION_1 | envelope.kind as u32);
        write_binary(envelope.name.as_bytes(), buf)?;
        buf.put_i32(envelope.seq_id);
        write_value(&envelope.value, buf)
    }

    fn decode_enveloped(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        let mut reader = Reader::new(data);
        let header = reader.read_u32()?;

        let (name, kind) = if header & STRICT_BIT == 0 {
            // Non-strict: the header is the name length.
            let name = reader.read_string(header as usize)?;
            let kind = EnvelopeKind::try_from(reader.read_u8()?)?;
            (name, kind)
        } else {
            if header & VERSION_MASK != VERSION_1 {
                return Err(ProtocolError::BadVersion(header));
            }
            #[allow(clippy::cast_possible_truncation)]
            let kind = EnvelopeKind::try_from((header & TYPE_MASK) as u8)?;
            let len = reader.read_size("envelope name")?;
            (reader.read_string(len)?, kind)
        };

        let seq_id = reader.read_i32()?;
        let value = reader.read_value(Type::Struct, 0)?;

        Ok(Envelope {
            name,
            kind,
            seq_id,
            value,
        })
    }
}

fn write_len(what: &'static str, len: usize, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    let len = i32::try_from(len).map_err(|_| ProtocolError::TooLarge {
        what,
        size: len,
        max: i32::MAX as usize,
    })?;
    buf.put_i32(len);
    Ok(())
}

fn write_binary(data: &[u8], buf: &mut BytesMut) -> Result<(), ProtocolError> {
    write_len("binary", data.len(), buf)?;
    buf.put_slice(data);
    Ok(())
}

fn write_items(list: &ValueList, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    buf.put_u8(list.value_type as u8);
    write_len("list", list.items.len(), buf)?;
    for item in &list.items {
        check_item(list.value_type, item)?;
        write_value(item, buf)?;
    }
    Ok(())
}

fn check_item(declared: Type, item: &Value) -> Result<(), ProtocolError> {
    let actual = item.ty();
    if actual == declared {
        Ok(())
    } else {
        Err(ProtocolError::ItemTypeMismatch { declared, actual })
    }
}

fn write_value(value: &Value, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    match value {
        Value::Bool(b) => buf.put_u8(u8::from(*b)),
        Value::I8(v) => buf.put_i8(*v),
        Value::Double(v) => buf.put_f64(*v),
        Value::I16(v) => buf.put_i16(*v),
        Value::I32(v) => buf.put_i32(*v),
        Value::I64(v) => buf.put_i64(*v),
        Value::Binary(data) => write_binary(data, buf)?,
        Value::Struct(s) => {
            for field in &s.fields {
                buf.put_u8(field.value.ty() as u8);
                buf.put_i16(field.id);
                write_value(&field.value, buf)?;
            }
            buf.put_u8(FIELD_STOP);
        }
        Value::Map(map) => {
            buf.put_u8(map.key_type as u8);
            buf.put_u8(map.value_type as u8);
            write_len("map", map.items.len(), buf)?;
            for (k, v) in &map.items {
                check_item(map.key_type, k)?;
                check_item(map.value_type, v)?;
                write_value(k, buf)?;
                write_value(v, buf)?;
            }
        }
        Value::Set(list) | Value::List(list) => write_items(list, buf)?,
    }
    Ok(())
}

/// Bounds-checked cursor over an input buffer.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, needed: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < needed {
            return Err(ProtocolError::UnexpectedEof {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_i8(&mut self) -> Result<i8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        self.need(2)?;
        Ok(self.buf.get_i16())
    }

    fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    fn read_size(&mut self, what: &'static str) -> Result<usize, ProtocolError> {
        let size = self.read_i32()?;
        usize::try_from(size).map_err(|_| ProtocolError::NegativeSize { what, size })
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, ProtocolError> {
        self.need(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    fn read_string(&mut self, len: usize) -> Result<String, ProtocolError> {
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn read_type(&mut self) -> Result<Type, ProtocolError> {
        Type::try_from(self.read_u8()?)
    }

    /// Every encoded item takes at least one byte, so a count larger than the
    /// remaining input is rejected before allocating.
    fn read_count(&mut self, what: &'static str, item_size: usize) -> Result<usize, ProtocolError> {
        let count = self.read_size(what)?;
        self.need(count.saturating_mul(item_size))?;
        Ok(count)
    }

    fn read_items(&mut self, depth: usize) -> Result<ValueList, ProtocolError> {
        let value_type = self.read_type()?;
        let count = self.read_count("list", 1)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_value(value_type, depth + 1)?);
        }
        Ok(ValueList { value_type, items })
    }

    fn read_value(&mut self, ty: Type, depth: usize) -> Result<Value, ProtocolError> {
        if depth > MAX_DEPTH {
            return Err(ProtocolError::TooDeep(MAX_DEPTH));
        }

        let value = match ty {
            Type::Bool => match self.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(ProtocolError::InvalidBool(other)),
            },
            Type::I8 => Value::I8(self.read_i8()?),
            Type::Double => Value::Double(self.read_f64()?),
            Type::I16 => Value::I16(self.read_i16()?),
            Type::I32 => Value::I32(self.read_i32()?),
            Type::I64 => Value::I64(self.read_i64()?),
            Type::Binary => {
                let len = self.read_size("binary")?;
                Value::Binary(self.read_bytes(len)?)
            }
            Type::Struct => {
                let mut fields = Vec::new();
                loop {
                    let code = self.read_u8()?;
                    if code == FIELD_STOP {
                        break;
                    }
                    let field_type = Type::try_from(code)?;
                    let id = self.read_i16()?;
                    fields.push(Field::new(id, self.read_value(field_type, depth + 1)?));
                }
                Value::Struct(Struct::new(fields))
            }
            Type::Map => {
                let key_type = self.read_type()?;
                let value_type = self.read_type()?;
                let count = self.read_count("map", 2)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let k = self.read_value(key_type, depth + 1)?;
                    let v = self.read_value(value_type, depth + 1)?;
                    items.push((k, v));
                }
                Value::Map(MapItems {
                    key_type,
                    value_type,
                    items,
                })
            }
            Type::Set => Value::Set(self.read_items(depth)?),
            Type::List => Value::List(self.read_items(depth)?),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn get_args(key: &str) -> Value {
        Value::Struct(Struct::new(vec![Field::new(1, Value::string(key))]))
    }

    #[test]
    fn test_strict_envelope_layout() {
        let mut buf = BytesMut::new();
        Binary
            .encode_enveloped(
                Envelope::new("Get", EnvelopeKind::Call, get_args("foo")),
                &mut buf,
            )
            .unwrap();

        let expected: &[u8] = &[
            0x80, 0x01, 0x00, 0x01, // version | Call
            0x00, 0x00, 0x00, 0x03, b'G', b'e', b't', // name
            0x00, 0x00, 0x00, 0x01, // seq id
            0x0b, 0x00, 0x01, // field 1: binary
            0x00, 0x00, 0x00, 0x03, b'f', b'o', b'o', //
            0x00, // stop
        ];
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn test_non_strict_envelope_is_accepted() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x03, b'G', b'e', b't', // name
            0x02, // Reply
            0x00, 0x00, 0x00, 0x07, // seq id
            0x00, // empty struct
        ];
        let envelope = Binary.decode_enveloped(data).unwrap();
        assert_eq!(envelope.name, "Get");
        assert_eq!(envelope.kind, EnvelopeKind::Reply);
        assert_eq!(envelope.seq_id, 7);
        assert_eq!(envelope.value, Value::Struct(Struct::default()));
    }

    #[test]
    fn test_bad_version() {
        let data: &[u8] = &[0x80, 0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Binary.decode_enveloped(data),
            Err(ProtocolError::BadVersion(0x8002_0002))
        ));
    }

    #[test]
    fn test_unknown_envelope_kind() {
        let data: &[u8] = &[0x80, 0x01, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Binary.decode_enveloped(data),
            Err(ProtocolError::UnknownEnvelopeKind(9))
        ));
    }

    #[test]
    fn test_truncated_input() {
        let mut buf = BytesMut::new();
        Binary
            .encode_enveloped(
                Envelope::new("Get", EnvelopeKind::Reply, get_args("foo")),
                &mut buf,
            )
            .unwrap();

        for len in 0..buf.len() {
            assert!(
                Binary.decode_enveloped(&buf[..len]).is_err(),
                "prefix of {len} bytes decoded"
            );
        }
    }

    #[test]
    fn test_negative_size() {
        let data: &[u8] = &[0xff, 0xff, 0xff, 0xfe];
        assert!(matches!(
            Binary.decode(data, Type::Binary),
            Err(ProtocolError::NegativeSize { size: -2, .. })
        ));
    }

    #[test]
    fn test_oversized_count_rejected_before_allocation() {
        // list<i32> claiming i32::MAX items with nothing following.
        let data: &[u8] = &[0x08, 0x7f, 0xff, 0xff, 0xff];
        assert!(matches!(
            Binary.decode(data, Type::List),
            Err(ProtocolError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut data = Vec::new();
        for _ in 0..=MAX_DEPTH + 1 {
            data.extend_from_slice(&[0x0c, 0x00, 0x01]);
        }
        assert!(matches!(
            Binary.decode(&data, Type::Struct),
            Err(ProtocolError::TooDeep(_))
        ));
    }

    #[test]
    fn test_mismatched_list_item() {
        let list = Value::List(ValueList {
            value_type: Type::I32,
            items: vec![Value::I32(1), Value::string("two")],
        });
        assert!(matches!(
            Binary.encode(&list, &mut BytesMut::new()),
            Err(ProtocolError::ItemTypeMismatch {
                declared: Type::I32,
                actual: Type::Binary
            })
        ));
    }

    #[test]
    fn test_invalid_bool() {
        assert!(matches!(
            Binary.decode(&[0x02], Type::Bool),
            Err(ProtocolError::InvalidBool(2))
        ));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i8>().prop_map(Value::I8),
            any::<i16>().prop_map(Value::I16),
            any::<i32>().prop_map(Value::I32),
            any::<i64>().prop_map(Value::I64),
            (-1.0e9f64..1.0e9).prop_map(Value::Double),
            ".{0,16}".prop_map(Value::string),
            proptest::collection::vec(any::<i64>(), 0..8).prop_map(|items| {
                Value::List(ValueList {
                    value_type: Type::I64,
                    items: items.into_iter().map(Value::I64).collect(),
                })
            }),
            proptest::collection::vec((".{0,8}", any::<i32>()), 0..8).prop_map(|items| {
                Value::Map(MapItems {
                    key_type: Type::Binary,
                    value_type: Type::I32,
                    items: items
                        .into_iter()
                        .map(|(k, v)| (Value::string(k), Value::I32(v)))
                        .collect(),
                })
            }),
        ]
    }

    fn structs() -> impl Strategy<Value = Value> {
        let fields = |inner: BoxedStrategy<Value>| {
            proptest::collection::vec((any::<i16>(), inner), 0..6).prop_map(|fields| {
                Value::Struct(Struct::new(
                    fields
                        .into_iter()
                        .map(|(id, value)| Field::new(id, value))
                        .collect(),
                ))
            })
        };
        fields(leaf().boxed()).prop_recursive(3, 32, 6, move |inner| {
            fields(prop_oneof![leaf(), inner].boxed())
        })
    }

    proptest! {
        #[test]
        fn prop_envelope_round_trip(
            name in "[A-Za-z_]{1,16}",
            kind in prop_oneof![
                Just(EnvelopeKind::Call),
                Just(EnvelopeKind::Reply),
                Just(EnvelopeKind::Exception),
                Just(EnvelopeKind::OneWay),
            ],
            value in structs(),
        ) {
            let mut buf = BytesMut::new();
            Binary
                .encode_enveloped(Envelope::new(name.clone(), kind, value.clone()), &mut buf)
                .unwrap();
            let decoded = Binary.decode_enveloped(&buf).unwrap();
            prop_assert_eq!(decoded.name, name);
            prop_assert_eq!(decoded.kind, kind);
            prop_assert_eq!(decoded.seq_id, crate::wire::SEQ_ID);
            prop_assert_eq!(decoded.value, value);
        }
    }
}
