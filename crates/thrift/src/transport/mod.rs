//! Transport boundary.
//!
//! The client never talks to the network itself. It hands a [`Request`] to a
//! [`UnaryOutbound`] or [`OnewayOutbound`] and interprets what comes back.
//! Connection management, peer selection and retries all live behind these
//! traits.

pub mod outbound;

pub use outbound::{CallFailure, ClientConfig, OnewayOutbound, OutboundConfig, UnaryOutbound};

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Request or response headers.
///
/// Keys are case-insensitive and stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    items: HashMap<String, String>,
}

impl Headers {
    /// Empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.items
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Look up a header, ignoring case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over `(key, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// A request as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Name of the calling service.
    pub caller: String,
    /// Name of the service being called.
    pub service: String,
    /// Encoding of the body.
    pub encoding: String,
    /// Procedure name, `Service::Method` for Thrift.
    pub procedure: String,
    /// Application headers.
    pub headers: Headers,
    /// Shard key, if any.
    pub shard_key: Option<String>,
    /// Routing key, if any.
    pub routing_key: Option<String>,
    /// Routing delegate, if any.
    pub routing_delegate: Option<String>,
    /// Encoded body.
    pub body: Bytes,
}

/// Response body stream. Dropping it releases the underlying resource.
pub type Body = Box<dyn AsyncRead + Send + Unpin>;

/// A response from a unary outbound.
pub struct Response {
    /// Application headers.
    pub headers: Headers,
    /// Set when the body carries an application-level failure.
    pub application_error: bool,
    /// Encoded body.
    pub body: Body,
}

impl Response {
    /// A successful response with no headers.
    pub fn new(body: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            headers: Headers::new(),
            application_error: false,
            body: Box::new(body),
        }
    }

    /// A response with a fully buffered body.
    #[must_use]
    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        Self::new(std::io::Cursor::new(body.into()))
    }

    /// Set the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Flag the response as an application error.
    #[must_use]
    pub const fn with_application_error(mut self, application_error: bool) -> Self {
        self.application_error = application_error;
        self
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("headers", &self.headers)
            .field("application_error", &self.application_error)
            .finish_non_exhaustive()
    }
}

/// Acknowledgement that a oneway request was handed off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack(String);

impl Ack {
    /// Create an acknowledgement with a transport-specific description.
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }

    /// The description.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call deadline and cancellation, forwarded to the transport as-is.
///
/// The client itself never enforces either.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl CallContext {
    /// A context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the call has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
