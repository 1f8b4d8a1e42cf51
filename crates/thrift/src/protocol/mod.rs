//! Protocol layer: how envelopes and values become bytes.
//!
//! This module contains:
//! - The [`Protocol`] trait every codec implements
//! - The default [`Binary`] codec
//! - The [`Multiplexed`] and [`NoEnvelope`] decorators
//! - [`ProtocolStrategy`], the codec a client resolves once and then uses for
//!   both requests and responses

pub mod binary;
pub mod multiplexed;
pub mod no_envelope;

pub use binary::Binary;
pub use multiplexed::Multiplexed;
pub use no_envelope::NoEnvelope;

use std::fmt::Debug;
use std::sync::Arc;

use bytes::BytesMut;
use tracing::debug;

use crate::error::{ConfigError, ProtocolError};
use crate::options::ClientOptions;
use crate::wire::{Envelope, Type, Value};

/// A wire codec for Thrift values and envelopes.
pub trait Protocol: Debug + Send + Sync {
    /// Append the encoding of `value` to `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn encode(&self, value: &Value, buf: &mut BytesMut) -> Result<(), ProtocolError>;

    /// Decode a value of type `ty` from `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a valid encoding of a `ty` value.
    fn decode(&self, data: &[u8], ty: Type) -> Result<Value, ProtocolError>;

    /// Append the encoding of `envelope` to `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be represented.
    fn encode_enveloped(&self, envelope: Envelope, buf: &mut BytesMut) -> Result<(), ProtocolError>;

    /// Decode an envelope from `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a valid envelope.
    fn decode_enveloped(&self, data: &[u8]) -> Result<Envelope, ProtocolError>;
}

/// The codec a client uses for its whole lifetime.
///
/// Built once from a base protocol and the client's options. The decorators
/// are applied in a fixed order: multiplexing wraps the base protocol, and
/// envelope removal wraps the result.
#[derive(Debug, Clone)]
pub struct ProtocolStrategy {
    protocol: Arc<dyn Protocol>,
    enveloping: bool,
    multiplexed_service: Option<String>,
}

impl ProtocolStrategy {
    /// Resolve the strategy for `thrift_service`.
    ///
    /// `base` defaults to [`Binary`].
    ///
    /// # Errors
    ///
    /// Returns an error if `thrift_service` is empty.
    pub fn resolve(
        base: Option<Arc<dyn Protocol>>,
        thrift_service: &str,
        options: &ClientOptions,
    ) -> Result<Self, ConfigError> {
        if thrift_service.is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }

        let mut protocol: Arc<dyn Protocol> = base.unwrap_or_else(|| Arc::new(Binary));

        let multiplexed_service = options.multiplexed.then(|| thrift_service.to_string());
        if let Some(service) = &multiplexed_service {
            protocol = Arc::new(Multiplexed::new(protocol, service.clone()));
        }

        let enveloping = !options.disable_enveloping;
        if !enveloping {
            protocol = Arc::new(NoEnvelope::new(protocol));
        }

        debug!(
            service = thrift_service,
            enveloping,
            multiplexed = multiplexed_service.is_some(),
            "resolved thrift protocol"
        );

        Ok(Self {
            protocol,
            enveloping,
            multiplexed_service,
        })
    }

    /// Whether requests carry an envelope.
    #[must_use]
    pub const fn enveloping(&self) -> bool {
        self.enveloping
    }

    /// Service used to tag envelope names, if multiplexed.
    #[must_use]
    pub fn multiplexed_service(&self) -> Option<&str> {
        self.multiplexed_service.as_deref()
    }

    /// The composed codec.
    #[must_use]
    pub fn protocol(&self) -> &Arc<dyn Protocol> {
        &self.protocol
    }
}

impl Protocol for ProtocolStrategy {
    fn encode(&self, value: &Value, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.protocol.encode(value, buf)
    }

    fn decode(&self, data: &[u8], ty: Type) -> Result<Value, ProtocolError> {
        self.protocol.decode(data, ty)
    }

    fn encode_enveloped(&self, envelope: Envelope, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.protocol.encode_enveloped(envelope, buf)
    }

    fn decode_enveloped(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        self.protocol.decode_enveloped(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{EnvelopeKind, Field, Struct};

    fn options(disable_enveloping: bool, multiplexed: bool) -> ClientOptions {
        ClientOptions {
            disable_enveloping,
            multiplexed,
        }
    }

    fn call() -> Envelope {
        Envelope::new(
            "Get",
            EnvelopeKind::Call,
            Struct::new(vec![Field::new(1, Value::string("foo"))]).into(),
        )
    }

    fn encode(strategy: &ProtocolStrategy) -> BytesMut {
        let mut buf = BytesMut::new();
        strategy.encode_enveloped(call(), &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_default_is_enveloped_binary() {
        let strategy = ProtocolStrategy::resolve(None, "KeyValue", &ClientOptions::default()).unwrap();
        assert!(strategy.enveloping());
        assert_eq!(strategy.multiplexed_service(), None);

        let mut expected = BytesMut::new();
        Binary.encode_enveloped(call(), &mut expected).unwrap();
        assert_eq!(encode(&strategy), expected);
        assert_eq!(strategy.decode_enveloped(&expected).unwrap(), call());
    }

    #[test]
    fn test_multiplexed() {
        let strategy = ProtocolStrategy::resolve(None, "KeyValue", &options(false, true)).unwrap();
        assert_eq!(strategy.multiplexed_service(), Some("KeyValue"));

        let decoded = Binary.decode_enveloped(&encode(&strategy)).unwrap();
        assert_eq!(decoded.name, "KeyValue:Get");
    }

    #[test]
    fn test_disable_enveloping_wins_over_multiplexing() {
        let strategy = ProtocolStrategy::resolve(None, "KeyValue", &options(true, true)).unwrap();
        assert!(!strategy.enveloping());

        let mut bare = BytesMut::new();
        Binary.encode(&call().value, &mut bare).unwrap();
        assert_eq!(encode(&strategy), bare);

        let reply = strategy.decode_enveloped(&bare).unwrap();
        assert_eq!(reply.kind, EnvelopeKind::Reply);
    }

    #[test]
    fn test_empty_service_is_rejected() {
        assert!(matches!(
            ProtocolStrategy::resolve(None, "", &ClientOptions::default()),
            Err(ConfigError::EmptyServiceName)
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for (disable, mux) in [(false, false), (false, true), (true, false), (true, true)] {
            let a = ProtocolStrategy::resolve(None, "KeyValue", &options(disable, mux)).unwrap();
            let b = ProtocolStrategy::resolve(None, "KeyValue", &options(disable, mux)).unwrap();
            assert_eq!(encode(&a), encode(&b));
            assert_eq!(a.enveloping(), b.enveloping());
            assert_eq!(a.multiplexed_service(), b.multiplexed_service());
        }
    }
}
