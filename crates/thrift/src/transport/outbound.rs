//! Outbound traits and the configuration that supplies them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Ack, CallContext, Request, Response};
use crate::error::TransportError;

/// Failure reported by a [`UnaryOutbound`].
///
/// A transport may attach the response it received. When that response is
/// flagged as an application error its body is still interpreted; any other
/// failure is returned to the caller unchanged.
pub struct CallFailure {
    /// The transport's error.
    pub error: TransportError,
    /// The response, if one was received.
    pub response: Option<Response>,
}

impl CallFailure {
    /// A failure with an attached response.
    pub fn with_response(error: impl Into<TransportError>, response: Response) -> Self {
        Self {
            error: error.into(),
            response: Some(response),
        }
    }
}

impl From<TransportError> for CallFailure {
    fn from(error: TransportError) -> Self {
        Self {
            error,
            response: None,
        }
    }
}

impl fmt::Debug for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallFailure")
            .field("error", &self.error)
            .field("response", &self.response)
            .finish()
    }
}

/// Sends requests that expect a response.
#[async_trait]
pub trait UnaryOutbound: Send + Sync + 'static {
    /// Send `request` and wait for the response.
    ///
    /// `ctx` carries the caller's deadline and cancellation.
    async fn call(&self, ctx: &CallContext, request: &Request) -> Result<Response, CallFailure>;
}

/// Sends requests that expect no response.
#[async_trait]
pub trait OnewayOutbound: Send + Sync + 'static {
    /// Send `request`, returning once the transport has accepted it.
    async fn call_oneway(&self, ctx: &CallContext, request: &Request) -> Result<Ack, TransportError>;
}

/// Identity and outbounds a client sends through.
pub trait ClientConfig: Send + Sync + 'static {
    /// Name of the calling service.
    fn caller(&self) -> &str;

    /// Name of the service being called.
    fn service(&self) -> &str;

    /// Outbound for unary calls, if configured.
    fn unary_outbound(&self) -> Option<Arc<dyn UnaryOutbound>>;

    /// Outbound for oneway calls, if configured.
    fn oneway_outbound(&self) -> Option<Arc<dyn OnewayOutbound>>;
}

/// Static [`ClientConfig`].
#[derive(Clone)]
pub struct OutboundConfig {
    caller: String,
    service: String,
    unary: Option<Arc<dyn UnaryOutbound>>,
    oneway: Option<Arc<dyn OnewayOutbound>>,
}

impl OutboundConfig {
    /// Configuration with no outbounds.
    pub fn new(caller: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            service: service.into(),
            unary: None,
            oneway: None,
        }
    }

    /// Set the unary outbound.
    #[must_use]
    pub fn with_unary(mut self, outbound: Arc<dyn UnaryOutbound>) -> Self {
        self.unary = Some(outbound);
        self
    }

    /// Set the oneway outbound.
    #[must_use]
    pub fn with_oneway(mut self, outbound: Arc<dyn OnewayOutbound>) -> Self {
        self.oneway = Some(outbound);
        self
    }
}

impl fmt::Debug for OutboundConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundConfig")
            .field("caller", &self.caller)
            .field("service", &self.service)
            .field("unary", &self.unary.is_some())
            .field("oneway", &self.oneway.is_some())
            .finish()
    }
}

impl ClientConfig for OutboundConfig {
    fn caller(&self) -> &str {
        &self.caller
    }

    fn service(&self) -> &str {
        &self.service
    }

    fn unary_outbound(&self) -> Option<Arc<dyn UnaryOutbound>> {
        self.unary.clone()
    }

    fn oneway_outbound(&self) -> Option<Arc<dyn OnewayOutbound>> {
        self.oneway.clone()
    }
}
