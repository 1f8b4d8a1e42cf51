//! Service multiplexing.

use std::sync::Arc;

use bytes::BytesMut;

use super::Protocol;
use crate::error::ProtocolError;
use crate::wire::{Envelope, Type, Value};

/// Separator between service and method in a multiplexed envelope name.
pub const SEPARATOR: char = ':';

/// Prefixes outbound envelope names with the owning service so several
/// services can share one endpoint. Decoding is passed through untouched.
#[derive(Debug, Clone)]
pub struct Multiplexed {
    inner: Arc<dyn Protocol>,
    service: String,
}

impl Multiplexed {
    /// Wrap `inner`, tagging names with `service`.
    pub fn new(inner: Arc<dyn Protocol>, service: impl Into<String>) -> Self {
        Self {
            inner,
            service: service.into(),
        }
    }

    /// The service used as prefix.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl Protocol for Multiplexed {
    fn encode(&self, value: &Value, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.inner.encode(value, buf)
    }

    fn decode(&self, data: &[u8], ty: Type) -> Result<Value, ProtocolError> {
        self.inner.decode(data, ty)
    }

    fn encode_enveloped(
        &self,
        mut envelope: Envelope,
        buf: &mut BytesMut,
    ) -> Result<(), ProtocolError> {
        envelope.name = format!("{}{SEPARATOR}{}", self.service, envelope.name);
        self.inner.encode_enveloped(envelope, buf)
    }

    fn decode_enveloped(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        self.inner.decode_enveloped(data)
    }
}
