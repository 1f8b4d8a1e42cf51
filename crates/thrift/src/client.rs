//! Thrift client.
//!
//! A [`Client`] turns method payloads into enveloped requests, hands them to
//! the configured outbound and interprets the envelope that comes back.

use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument, trace};

use crate::ENCODING;
use crate::error::{
    ConfigError, DecodeFailure, Error, RequestEncodeError, ResponseDecodeError, Result,
    TransportError, ValidationError,
};
use crate::exception::{ApplicationException, ThriftException};
use crate::options::{CallOptions, ClientOptions};
use crate::payload::{Enveloper, FromWire};
use crate::procedure;
use crate::protocol::{Protocol, ProtocolStrategy};
use crate::transport::{
    Ack, Body, CallContext, CallFailure, ClientConfig, Headers, Request, Response,
};
use crate::wire::{Envelope, EnvelopeKind, Value};

/// Initial capacity of request and response buffers.
pub const BUFFER_CAPACITY: usize = 10 * 1024;

/// Builder for creating Thrift clients.
pub struct ClientBuilder {
    service: String,
    config: Arc<dyn ClientConfig>,
    protocol: Option<Arc<dyn Protocol>>,
    options: ClientOptions,
}

impl ClientBuilder {
    /// Create a builder for the Thrift service `service`, sending through
    /// `config`.
    pub fn new(service: impl Into<String>, config: Arc<dyn ClientConfig>) -> Self {
        Self {
            service: service.into(),
            config,
            protocol: None,
            options: ClientOptions::default(),
        }
    }

    /// Use a codec other than the default binary protocol.
    #[must_use]
    pub fn protocol(mut self, protocol: Arc<dyn Protocol>) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Send payloads without envelopes.
    #[must_use]
    pub const fn disable_enveloping(mut self, disable: bool) -> Self {
        self.options.disable_enveloping = disable;
        self
    }

    /// Tag envelope names with the service name.
    #[must_use]
    pub const fn multiplexed(mut self, multiplexed: bool) -> Self {
        self.options.multiplexed = multiplexed;
        self
    }

    /// Replace all protocol options at once.
    #[must_use]
    pub const fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the service name is empty.
    pub fn build(self) -> Result<Client> {
        let strategy = ProtocolStrategy::resolve(self.protocol, &self.service, &self.options)?;

        Ok(Client {
            strategy,
            config: self.config,
            thrift_service: self.service,
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("service", &self.service)
            .field("protocol", &self.protocol)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Result of a unary call made with [`Client::call_with_options`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    /// The reply payload.
    pub value: Value,
    /// Headers returned by the transport.
    pub headers: Headers,
}

/// Client for one Thrift service.
///
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct Client {
    strategy: ProtocolStrategy,
    config: Arc<dyn ClientConfig>,
    thrift_service: String,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(service: impl Into<String>, config: Arc<dyn ClientConfig>) -> ClientBuilder {
        ClientBuilder::new(service, config)
    }

    /// Name of the Thrift service.
    #[must_use]
    pub fn thrift_service(&self) -> &str {
        &self.thrift_service
    }

    /// Whether requests are enveloped.
    #[must_use]
    pub const fn enveloping(&self) -> bool {
        self.strategy.enveloping()
    }

    /// Call a method and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is rejected, the transport fails, the
    /// response cannot be decoded or the procedure raised an application
    /// exception.
    #[instrument(skip_all, fields(service = %self.thrift_service, method = payload.method_name()))]
    pub async fn call(&self, ctx: &CallContext, payload: &dyn Enveloper) -> Result<Value> {
        let response = self
            .call_with_options(ctx, payload, &CallOptions::default())
            .await?;
        Ok(response.value)
    }

    /// Call a method with per-call metadata, returning the reply together with
    /// the response headers.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    #[instrument(skip_all, fields(service = %self.thrift_service, method = payload.method_name()))]
    pub async fn call_with_options(
        &self,
        ctx: &CallContext,
        payload: &dyn Enveloper,
        options: &CallOptions,
    ) -> Result<CallResponse> {
        let request = self.build_request(payload, payload.envelope_kind(), options)?;
        let outbound = self
            .config
            .unary_outbound()
            .ok_or_else(|| self.missing_outbound("unary"))?;

        debug!(procedure = %request.procedure, "Sending request");

        let response = match outbound.call(ctx, &request).await {
            Ok(response) => response,
            Err(CallFailure {
                error,
                response: Some(response),
            }) if response.application_error => {
                debug!(%error, "Transport reported an application error, decoding body");
                response
            }
            Err(failure) => return Err(failure.error.into()),
        };

        let Response { headers, body, .. } = response;
        let data = read_body(body).await.map_err(TransportError::from)?;
        trace!(size = data.len(), "Read response body");

        let value = self.decode_response(&request, &data)?;
        Ok(CallResponse { value, headers })
    }

    /// Send a oneway message.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is rejected or the transport fails.
    #[instrument(skip_all, fields(service = %self.thrift_service, method = payload.method_name()))]
    pub async fn call_oneway(&self, ctx: &CallContext, payload: &dyn Enveloper) -> Result<Ack> {
        self.call_oneway_with_options(ctx, payload, &CallOptions::default())
            .await
    }

    /// Send a oneway message with per-call metadata.
    ///
    /// # Errors
    ///
    /// Same as [`call_oneway`](Self::call_oneway).
    #[instrument(skip_all, fields(service = %self.thrift_service, method = payload.method_name()))]
    pub async fn call_oneway_with_options(
        &self,
        ctx: &CallContext,
        payload: &dyn Enveloper,
        options: &CallOptions,
    ) -> Result<Ack> {
        let request = self.build_request(payload, EnvelopeKind::OneWay, options)?;
        let outbound = self
            .config
            .oneway_outbound()
            .ok_or_else(|| self.missing_outbound("oneway"))?;

        debug!(procedure = %request.procedure, "Sending oneway request");

        let ack = outbound.call_oneway(ctx, &request).await?;
        Ok(ack)
    }

    /// Validate, serialize and encode `payload` into a transport request.
    fn build_request(
        &self,
        payload: &dyn Enveloper,
        kind: EnvelopeKind,
        options: &CallOptions,
    ) -> Result<Request> {
        let method = payload.method_name();
        let declared = payload.envelope_kind();
        if !declared.is_outbound() {
            return Err(ValidationError::UnexpectedEnvelopeKind {
                method: method.to_string(),
                kind: declared,
            }
            .into());
        }

        let value = payload.to_wire().map_err(ValidationError::from)?;

        let mut request = Request {
            caller: self.config.caller().to_string(),
            service: self.config.service().to_string(),
            encoding: ENCODING.to_string(),
            procedure: procedure::to_name(&self.thrift_service, method),
            headers: options.headers.clone(),
            shard_key: options.shard_key.clone(),
            routing_key: options.routing_key.clone(),
            routing_delegate: options.routing_delegate.clone(),
            body: Bytes::new(),
        };

        let mut buf = BytesMut::with_capacity(BUFFER_CAPACITY);
        if let Err(source) = self
            .strategy
            .encode_enveloped(Envelope::new(method, kind, value), &mut buf)
        {
            return Err(RequestEncodeError {
                request: Box::new(request),
                source,
            }
            .into());
        }

        trace!(size = buf.len(), "Encoded request body");
        request.body = buf.freeze();
        Ok(request)
    }

    /// Interpret a response body.
    fn decode_response(&self, request: &Request, data: &[u8]) -> Result<Value> {
        let fail = |source: DecodeFailure| ResponseDecodeError {
            request: Box::new(request.clone()),
            source,
        };

        let envelope = self
            .strategy
            .decode_enveloped(data)
            .map_err(|e| fail(e.into()))?;

        match envelope.kind {
            EnvelopeKind::Reply => Ok(envelope.value),
            EnvelopeKind::Exception => {
                let reason =
                    ApplicationException::from_wire(&envelope.value).map_err(|e| fail(e.into()))?;
                debug!(%reason, "Procedure raised an application exception");
                Err(ThriftException {
                    service: request.service.clone(),
                    procedure: request.procedure.clone(),
                    reason,
                }
                .into())
            }
            kind => Err(fail(DecodeFailure::UnexpectedEnvelopeKind(kind)).into()),
        }
    }

    fn missing_outbound(&self, kind: &'static str) -> Error {
        ConfigError::MissingOutbound {
            kind,
            service: self.config.service().to_string(),
        }
        .into()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("thrift_service", &self.thrift_service)
            .field("strategy", &self.strategy)
            .field("caller", &self.config.caller())
            .field("service", &self.config.service())
            .finish()
    }
}

/// Drain a response body. The body is released when this returns.
async fn read_body(mut body: Body) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::with_capacity(BUFFER_CAPACITY);
    body.read_to_end(&mut data).await?;
    Ok(data)
}
