//! Test helpers: payloads, in-memory outbounds and tracked response bodies.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use proven_thrift::{
    Ack, ApplicationException, Binary, CallContext, CallFailure, Client, ClientConfig, Envelope,
    EnvelopeKind, Enveloper, Field, OnewayOutbound, OutboundConfig, PayloadError, Protocol,
    Request, Response, Struct, TransportError, UnaryOutbound, Value,
};
use tokio::io::{AsyncRead, ReadBuf};

/// Transport-level service name used by every test client.
pub const SERVICE: &str = "keyvalue";
/// Caller name used by every test client.
pub const CALLER: &str = "tester";
/// Thrift service name used by every test client.
pub const THRIFT_SERVICE: &str = "KeyValue";

/// A generated-style payload with a single string argument.
pub struct Args {
    pub method: &'static str,
    pub kind: EnvelopeKind,
    pub key: String,
    pub fail: Option<&'static str>,
}

impl Args {
    pub fn call(method: &'static str, key: &str) -> Self {
        Self {
            method,
            kind: EnvelopeKind::Call,
            key: key.to_string(),
            fail: None,
        }
    }

    pub fn oneway(method: &'static str, key: &str) -> Self {
        Self {
            kind: EnvelopeKind::OneWay,
            ..Self::call(method, key)
        }
    }

    pub fn with_kind(mut self, kind: EnvelopeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn failing(mut self, message: &'static str) -> Self {
        self.fail = Some(message);
        self
    }

    /// The value `to_wire` produces.
    pub fn value(&self) -> Value {
        args_value(&self.key)
    }
}

impl Enveloper for Args {
    fn method_name(&self) -> &str {
        self.method
    }

    fn envelope_kind(&self) -> EnvelopeKind {
        self.kind
    }

    fn to_wire(&self) -> Result<Value, PayloadError> {
        match self.fail {
            Some(message) => Err(PayloadError::new(message)),
            None => Ok(self.value()),
        }
    }
}

pub fn args_value(key: &str) -> Value {
    Struct::new(vec![Field::new(1, Value::string(key))]).into()
}

/// A result struct holding `value` in field 0.
pub fn result_value(value: &str) -> Value {
    Struct::new(vec![Field::new(0, Value::string(value))]).into()
}

/// Encode an envelope with the binary protocol.
pub fn envelope_bytes(name: &str, kind: EnvelopeKind, value: Value) -> Bytes {
    let mut buf = BytesMut::new();
    Binary
        .encode_enveloped(Envelope::new(name, kind, value), &mut buf)
        .unwrap();
    buf.freeze()
}

pub fn reply_bytes(name: &str, value: Value) -> Bytes {
    envelope_bytes(name, EnvelopeKind::Reply, value)
}

pub fn exception_bytes(name: &str, exception: &ApplicationException) -> Bytes {
    envelope_bytes(name, EnvelopeKind::Exception, exception.to_wire())
}

/// Flags shared with a [`TrackedBody`].
#[derive(Debug, Clone, Default)]
pub struct BodyProbe {
    read: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl BodyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_read(&self) -> bool {
        self.read.load(Ordering::SeqCst)
    }

    pub fn was_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    /// A body serving `data`, or failing on first read when `data` is `None`.
    pub fn body(&self, data: Option<Bytes>) -> TrackedBody {
        TrackedBody {
            data: data.map(io::Cursor::new),
            probe: self.clone(),
        }
    }
}

/// Response body that records reads and drops.
pub struct TrackedBody {
    data: Option<io::Cursor<Bytes>>,
    probe: BodyProbe,
}

impl AsyncRead for TrackedBody {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.probe.read.store(true, Ordering::SeqCst);
        match self.data.as_mut() {
            Some(cursor) => Pin::new(cursor).poll_read(cx, buf),
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "stream reset",
            ))),
        }
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}

type Handler = dyn Fn(&Request) -> Result<Response, CallFailure> + Send + Sync;

/// Unary outbound answering every request through a closure.
pub struct MockUnary {
    handler: Box<Handler>,
    requests: Mutex<Vec<Request>>,
}

impl MockUnary {
    pub fn new(
        handler: impl Fn(&Request) -> Result<Response, CallFailure> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with a reply envelope for the requested method.
    pub fn replying(value: Value) -> Arc<Self> {
        Self::new(move |request| {
            let (_, method) = proven_thrift::procedure::from_name(&request.procedure);
            Ok(Response::from_bytes(reply_bytes(method, value.clone())))
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl UnaryOutbound for MockUnary {
    async fn call(&self, _ctx: &CallContext, request: &Request) -> Result<Response, CallFailure> {
        self.requests.lock().push(request.clone());
        (self.handler)(request)
    }
}

/// Oneway outbound that records requests.
#[derive(Default)]
pub struct MockOneway {
    requests: Mutex<Vec<Request>>,
    fail: Option<&'static str>,
    acks: AtomicUsize,
}

impl MockOneway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            fail: Some(message),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl OnewayOutbound for MockOneway {
    async fn call_oneway(&self, _ctx: &CallContext, request: &Request) -> Result<Ack, TransportError> {
        self.requests.lock().push(request.clone());
        if let Some(message) = self.fail {
            return Err(TransportError::new(message));
        }
        let n = self.acks.fetch_add(1, Ordering::SeqCst);
        Ok(Ack::new(format!("ack-{n}")))
    }
}

/// Transport configuration with both outbounds.
pub fn config(unary: Arc<MockUnary>, oneway: Arc<MockOneway>) -> Arc<dyn ClientConfig> {
    Arc::new(
        OutboundConfig::new(CALLER, SERVICE)
            .with_unary(unary)
            .with_oneway(oneway),
    )
}

/// Default client over `unary`.
pub fn client(unary: Arc<MockUnary>) -> Client {
    Client::builder(THRIFT_SERVICE, config(unary, MockOneway::new()))
        .build()
        .unwrap()
}
