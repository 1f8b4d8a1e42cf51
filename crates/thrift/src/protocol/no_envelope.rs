//! Envelope-less requests.

use std::sync::Arc;

use bytes::BytesMut;

use super::Protocol;
use crate::error::ProtocolError;
use crate::wire::{Envelope, EnvelopeKind, SEQ_ID, Type, Value};

/// Writes only the envelope's payload, and reads bare struct responses back
/// as replies.
///
/// Servers that do not expect envelopes answer with a bare result struct,
/// which can only ever be a reply.
#[derive(Debug, Clone)]
pub struct NoEnvelope {
    inner: Arc<dyn Protocol>,
}

impl NoEnvelope {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Protocol>) -> Self {
        Self { inner }
    }
}

impl Protocol for NoEnvelope {
    fn encode(&self, value: &Value, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.inner.encode(value, buf)
    }

    fn decode(&self, data: &[u8], ty: Type) -> Result<Value, ProtocolError> {
        self.inner.decode(data, ty)
    }

    fn encode_enveloped(&self, envelope: Envelope, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.inner.encode(&envelope.value, buf)
    }

    fn decode_enveloped(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        let value = self.inner.decode(data, Type::Struct)?;
        Ok(Envelope {
            // Unused by the response path.
            name: String::new(),
            kind: EnvelopeKind::Reply,
            seq_id: SEQ_ID,
            value,
        })
    }
}
