//! Client and call options.

use serde::{Deserialize, Serialize};

use crate::transport::Headers;

/// Protocol options fixed for the lifetime of a client.
///
/// Deserializable so the flags can come from service configuration; missing
/// fields take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Send bare payloads without the envelope header.
    ///
    /// Responses are then read as bare reply structs.
    pub disable_enveloping: bool,

    /// Prefix envelope names with the Thrift service name so that several
    /// services can share a single endpoint.
    pub multiplexed: bool,
}

/// Per-call metadata copied onto the transport request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Application headers.
    pub headers: Headers,
    /// Shard key.
    pub shard_key: Option<String>,
    /// Routing key.
    pub routing_key: Option<String>,
    /// Routing delegate.
    pub routing_delegate: Option<String>,
}

impl CallOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the shard key.
    #[must_use]
    pub fn shard_key(mut self, key: impl Into<String>) -> Self {
        self.shard_key = Some(key.into());
        self
    }

    /// Set the routing key.
    #[must_use]
    pub fn routing_key(mut self, key: impl Into<String>) -> Self {
        self.routing_key = Some(key.into());
        self
    }

    /// Set the routing delegate.
    #[must_use]
    pub fn routing_delegate(mut self, delegate: impl Into<String>) -> Self {
        self.routing_delegate = Some(delegate.into());
        self
    }
}
