//! Thrift envelope client over pluggable RPC transports.
//!
//! This crate builds Thrift requests from method payloads, sends them through
//! an abstract outbound and interprets the envelopes that come back.
//!
//! # Features
//!
//! - **Binary Protocol**: Strict envelope writer, strict and non-strict reader
//! - **Multiplexing**: Optional `Service:Method` envelope names
//! - **Bare Payloads**: Optional envelope omission for servers that expect it
//! - **Typed Failures**: Validation, encode, transport, decode and application
//!   exceptions are kept apart
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use proven_thrift::{
//!     CallContext, Client, Enveloper, EnvelopeKind, Field, OutboundConfig, PayloadError,
//!     Struct, UnaryOutbound, Value,
//! };
//!
//! struct GetArgs {
//!     key: String,
//! }
//!
//! impl Enveloper for GetArgs {
//!     fn method_name(&self) -> &str {
//!         "Get"
//!     }
//!
//!     fn envelope_kind(&self) -> EnvelopeKind {
//!         EnvelopeKind::Call
//!     }
//!
//!     fn to_wire(&self) -> Result<Value, PayloadError> {
//!         Ok(Struct::new(vec![Field::new(1, Value::string(self.key.clone()))]).into())
//!     }
//! }
//!
//! async fn example(outbound: Arc<dyn UnaryOutbound>) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OutboundConfig::new("my-service", "keyvalue").with_unary(outbound);
//!     let client = Client::builder("KeyValue", Arc::new(config)).build()?;
//!
//!     let _reply = client
//!         .call(&CallContext::new(), &GetArgs { key: "foo".to_string() })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod exception;
pub mod idl;
pub mod options;
pub mod payload;
pub mod procedure;
pub mod protocol;
pub mod transport;
pub mod wire;

/// Encoding name reported on every request.
pub const ENCODING: &str = "thrift";

// Re-export commonly used types
pub use client::{CallResponse, Client, ClientBuilder};
pub use error::{
    ConfigError, DecodeFailure, Error, FromWireError, PayloadError, ProtocolError,
    RequestEncodeError, ResponseDecodeError, Result, TransportError, ValidationError,
};
pub use exception::{ApplicationException, ExceptionType, ThriftException};
pub use idl::{THRIFT_MODULE, ThriftModule};
pub use options::{CallOptions, ClientOptions};
pub use payload::{Enveloper, FromWire};
pub use protocol::{Binary, Multiplexed, NoEnvelope, Protocol, ProtocolStrategy};
pub use transport::{
    Ack, Body, CallContext, CallFailure, ClientConfig, Headers, OnewayOutbound, OutboundConfig,
    Request, Response, UnaryOutbound,
};
pub use wire::{Envelope, EnvelopeKind, Field, MapItems, SEQ_ID, Struct, Type, Value, ValueList};

// Re-export dependencies that are part of our public API
pub use bytes::Bytes;
pub use tokio_util::sync::CancellationToken;
