//! Publish/subscribe transport.
//!
//! The packer hands its finished buffer to a [`Transport`]. Sends are
//! fire-and-forget: there is no acknowledgement and no backpressure, and a
//! message published while nobody subscribes is silently dropped.
//!
//! [`PubSocket`] is the in-process implementation. It publishes over a
//! [`Context`], a shared registry of endpoints that [`Subscriber`]s attach to.
//! Use [`Context::global`] for the process-wide context, or [`Context::new`]
//! for an isolated one.
//!
//! ```rust
//! use pubpack::transport::{Context, PubSocket, Transport};
//!
//! let ctx = Context::new();
//! let mut socket = PubSocket::new(&ctx);
//! socket.bind("inproc://levels").unwrap();
//!
//! let sub = ctx.subscribe("inproc://levels").unwrap();
//! assert_eq!(socket.send(b"abc").unwrap(), 3);
//! assert_eq!(sub.try_recv(), Some(b"abc".to_vec()));
//! ```
//!
//! Endpoints are written `scheme://address` with scheme `tcp`, `ipc` or
//! `inproc`. A `tcp` endpoint is `host:port`; a bound `tcp` endpoint is
//! reachable through any host name with the same port.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::{debug, trace};

/// How a session is attached to its endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Client side: connects to a bound peer.
    Connect,
    /// Server side: binds the endpoint.
    #[default]
    Bind,
}

impl Mode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Connect => "connect",
            Mode::Bind => "bind",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operations a publisher needs from its transport.
///
/// Every method may fail with a transport error. Implementations do not
/// retry.
pub trait Transport {
    fn connect(&mut self, endpoint: &str) -> Result<()>;

    fn bind(&mut self, endpoint: &str) -> Result<()>;

    fn disconnect(&mut self, endpoint: &str) -> Result<()>;

    fn unbind(&mut self, endpoint: &str) -> Result<()>;

    /// The endpoint most recently connected or bound, as resolved by the
    /// transport.
    fn last_endpoint(&self) -> Option<&str>;

    /// Publishes one message and returns the number of bytes accepted.
    fn send(&mut self, bytes: &[u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, endpoint: &str) -> Result<()> {
        (**self).connect(endpoint)
    }

    fn bind(&mut self, endpoint: &str) -> Result<()> {
        (**self).bind(endpoint)
    }

    fn disconnect(&mut self, endpoint: &str) -> Result<()> {
        (**self).disconnect(endpoint)
    }

    fn unbind(&mut self, endpoint: &str) -> Result<()> {
        (**self).unbind(endpoint)
    }

    fn last_endpoint(&self) -> Option<&str> {
        (**self).last_endpoint()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).send(bytes)
    }
}

/// Resolves an endpoint to its registry key.
///
/// ```rust
/// use pubpack::transport::endpoint_key;
///
/// assert_eq!(endpoint_key("tcp://localhost:5555").unwrap(), "tcp://*:5555");
/// assert_eq!(endpoint_key("inproc://a").unwrap(), "inproc://a");
/// assert!(endpoint_key("localhost:5555").is_err());
/// assert!(endpoint_key("udp://x:1").is_err());
/// ```
pub fn endpoint_key(endpoint: &str) -> Result<String> {
    let (scheme, address) = endpoint
        .split_once("://")
        .ok_or_else(|| Error::transport(format!("invalid endpoint '{}'", endpoint)))?;
    if address.is_empty() {
        return Err(Error::transport(format!("invalid endpoint '{}'", endpoint)));
    }

    match scheme {
        "tcp" => {
            let (host, port) = address
                .rsplit_once(':')
                .ok_or_else(|| Error::transport(format!("invalid endpoint '{}'", endpoint)))?;
            if host.is_empty() || port.parse::<u16>().is_err() {
                return Err(Error::transport(format!("invalid endpoint '{}'", endpoint)));
            }
            Ok(format!("tcp://*:{}", port))
        }
        "ipc" | "inproc" => Ok(endpoint.to_string()),
        _ => Err(Error::transport(format!(
            "protocol not supported '{}'",
            scheme
        ))),
    }
}

#[derive(Default)]
struct Channel {
    bound_by: Option<u64>,
    subscribers: Vec<flume::Sender<Vec<u8>>>,
}

impl Channel {
    /// Forgets subscribers whose receiver was dropped.
    fn prune(&mut self) {
        self.subscribers.retain(|tx| !tx.is_disconnected());
    }

    fn is_idle(&self) -> bool {
        self.bound_by.is_none() && self.subscribers.is_empty()
    }
}

#[derive(Default)]
struct Registry {
    channels: IndexMap<String, Channel>,
}

impl Registry {
    /// Drops every channel nobody binds or listens on.
    fn sweep(&mut self) {
        self.channels.retain(|_, channel| {
            channel.prune();
            !channel.is_idle()
        });
    }

    fn remove_if_idle(&mut self, key: &str) {
        if self.channels.get(key).map_or(false, Channel::is_idle) {
            self.channels.swap_remove(key);
        }
    }
}

/// Shared message bus that sockets and subscribers attach to.
///
/// Cloning is cheap and yields a handle to the same bus.
#[derive(Clone, Default)]
pub struct Context {
    registry: Arc<Mutex<Registry>>,
    next_socket: Arc<AtomicU64>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("endpoints", &self.lock().channels.len())
            .finish()
    }
}

impl Context {
    /// Creates an isolated context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide context, created on first use.
    pub fn global() -> Context {
        static GLOBAL: OnceLock<Context> = OnceLock::new();
        GLOBAL.get_or_init(Context::new).clone()
    }

    /// Attaches a new subscriber to `endpoint`.
    ///
    /// Subscribing before anything binds the endpoint is allowed.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the endpoint is malformed.
    pub fn subscribe(&self, endpoint: &str) -> Result<Subscriber> {
        let key = endpoint_key(endpoint)?;
        let (tx, rx) = flume::unbounded();
        let mut registry = self.lock();
        registry.sweep();
        registry
            .channels
            .entry(key.clone())
            .or_default()
            .subscribers
            .push(tx);
        debug!(endpoint = %key, "subscriber attached");
        Ok(Subscriber { endpoint: key, rx })
    }

    /// Returns `true` if some socket has bound `endpoint`.
    pub fn is_bound(&self, endpoint: &str) -> bool {
        endpoint_key(endpoint)
            .map(|key| {
                self.lock()
                    .channels
                    .get(&key)
                    .map_or(false, |channel| channel.bound_by.is_some())
            })
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // a poisoned registry is still structurally valid
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn socket_id(&self) -> u64 {
        self.next_socket.fetch_add(1, Ordering::Relaxed)
    }

    fn claim(&self, key: &str, socket: u64) -> Result<()> {
        let mut registry = self.lock();
        let channel = registry.channels.entry(key.to_string()).or_default();
        match channel.bound_by {
            Some(owner) if owner != socket => Err(Error::transport("address already in use")),
            _ => {
                channel.bound_by = Some(socket);
                Ok(())
            }
        }
    }

    fn release(&self, key: &str, socket: u64) {
        let mut registry = self.lock();
        if let Some(channel) = registry.channels.get_mut(key) {
            if channel.bound_by == Some(socket) {
                channel.bound_by = None;
            }
            channel.prune();
        }
        registry.remove_if_idle(key);
    }

    fn publish(&self, key: &str, bytes: &[u8]) -> usize {
        let mut registry = self.lock();
        let Some(channel) = registry.channels.get_mut(key) else {
            return 0;
        };
        channel
            .subscribers
            .retain(|tx| tx.send(bytes.to_vec()).is_ok());
        let delivered = channel.subscribers.len();
        registry.remove_if_idle(key);
        delivered
    }

    #[cfg(test)]
    fn endpoints(&self) -> usize {
        self.lock().channels.len()
    }
}

/// Receiving end attached to one endpoint of a [`Context`].
#[derive(Debug)]
pub struct Subscriber {
    endpoint: String,
    rx: flume::Receiver<Vec<u8>>,
}

impl Subscriber {
    /// The registry key this subscriber listens on.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Takes the oldest pending message, if any.
    pub fn try_recv(&self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Takes every pending message, oldest first.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.rx.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// In-process publish socket.
#[derive(Debug)]
pub struct PubSocket {
    ctx: Context,
    id: u64,
    attached: Vec<(Mode, String)>,
    last_endpoint: Option<String>,
}

impl PubSocket {
    pub fn new(ctx: &Context) -> Self {
        PubSocket {
            ctx: ctx.clone(),
            id: ctx.socket_id(),
            attached: Vec::new(),
            last_endpoint: None,
        }
    }

    fn detach(&mut self, endpoint: &str, mode: Mode) -> Result<()> {
        let key = endpoint_key(endpoint)?;
        let index = self
            .attached
            .iter()
            .position(|(m, k)| *m == mode && *k == key)
            .ok_or_else(|| Error::transport(format!("endpoint not attached '{}'", endpoint)))?;
        self.attached.remove(index);
        if mode == Mode::Bind {
            self.ctx.release(&key, self.id);
        }
        debug!(%mode, endpoint = %key, "socket detached");
        Ok(())
    }
}

impl Transport for PubSocket {
    fn connect(&mut self, endpoint: &str) -> Result<()> {
        let key = endpoint_key(endpoint)?;
        debug!(endpoint = %key, "socket connected");
        self.attached.push((Mode::Connect, key));
        self.last_endpoint = Some(endpoint.to_string());
        Ok(())
    }

    fn bind(&mut self, endpoint: &str) -> Result<()> {
        let key = endpoint_key(endpoint)?;
        self.ctx.claim(&key, self.id)?;
        debug!(endpoint = %key, "socket bound");
        self.attached.push((Mode::Bind, key));
        self.last_endpoint = Some(endpoint.to_string());
        Ok(())
    }

    fn disconnect(&mut self, endpoint: &str) -> Result<()> {
        self.detach(endpoint, Mode::Connect)
    }

    fn unbind(&mut self, endpoint: &str) -> Result<()> {
        self.detach(endpoint, Mode::Bind)
    }

    fn last_endpoint(&self) -> Option<&str> {
        self.last_endpoint.as_deref()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        for (_, key) in &self.attached {
            let delivered = self.ctx.publish(key, bytes);
            trace!(endpoint = %key, len = bytes.len(), delivered, "published");
        }
        Ok(bytes.len())
    }
}

impl Drop for PubSocket {
    fn drop(&mut self) {
        for (mode, key) in self.attached.drain(..) {
            if mode == Mode::Bind {
                self.ctx.release(&key, self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_key() {
        assert_eq!(endpoint_key("tcp://*:5555").unwrap(), "tcp://*:5555");
        assert_eq!(endpoint_key("tcp://127.0.0.1:80").unwrap(), "tcp://*:80");
        assert_eq!(endpoint_key("ipc:///tmp/feed").unwrap(), "ipc:///tmp/feed");
        assert!(endpoint_key("tcp://localhost").is_err());
        assert!(endpoint_key("tcp://localhost:port").is_err());
        assert!(endpoint_key("inproc://").is_err());
        assert!(endpoint_key("").is_err());
    }

    #[test]
    fn test_fan_out_to_subscribers() {
        let ctx = Context::new();
        let mut socket = PubSocket::new(&ctx);
        socket.bind("tcp://*:6000").unwrap();
        let a = ctx.subscribe("tcp://localhost:6000").unwrap();
        let b = ctx.subscribe("tcp://127.0.0.1:6000").unwrap();

        socket.send(&[1, 2]).unwrap();
        socket.send(&[3]).unwrap();

        assert_eq!(a.drain(), vec![vec![1, 2], vec![3]]);
        assert_eq!(b.pending(), 2);
    }

    #[test]
    fn test_send_without_subscribers_is_dropped() {
        let ctx = Context::new();
        let mut socket = PubSocket::new(&ctx);
        socket.connect("inproc://nobody").unwrap();
        assert_eq!(socket.send(&[0; 10]).unwrap(), 10);

        let late = ctx.subscribe("inproc://nobody").unwrap();
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn test_address_in_use() {
        let ctx = Context::new();
        let mut first = PubSocket::new(&ctx);
        let mut second = PubSocket::new(&ctx);
        first.bind("inproc://x").unwrap();
        assert!(ctx.is_bound("inproc://x"));
        assert_eq!(
            second.bind("inproc://x"),
            Err(Error::transport("address already in use"))
        );

        first.unbind("inproc://x").unwrap();
        assert!(!ctx.is_bound("inproc://x"));
        second.bind("inproc://x").unwrap();
    }

    #[test]
    fn test_drop_releases_binding() {
        let ctx = Context::new();
        {
            let mut socket = PubSocket::new(&ctx);
            socket.bind("inproc://y").unwrap();
        }
        assert!(!ctx.is_bound("inproc://y"));
    }

    #[test]
    fn test_detach_unknown_endpoint() {
        let ctx = Context::new();
        let mut socket = PubSocket::new(&ctx);
        socket.connect("inproc://z").unwrap();
        assert!(socket.unbind("inproc://z").is_err());
        assert!(socket.disconnect("inproc://other").is_err());
        socket.disconnect("inproc://z").unwrap();
        assert_eq!(socket.last_endpoint(), Some("inproc://z"));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let ctx = Context::new();
        let mut socket = PubSocket::new(&ctx);
        socket.connect("inproc://p").unwrap();
        let sub = ctx.subscribe("inproc://p").unwrap();
        drop(sub);
        assert_eq!(ctx.publish("inproc://p", b"x"), 0);
        assert_eq!(ctx.endpoints(), 0);
    }

    #[test]
    fn test_registry_stays_bounded_under_churn() {
        let ctx = Context::new();
        for _ in 0..1000 {
            drop(ctx.subscribe("inproc://churn").unwrap());
        }
        assert_eq!(ctx.endpoints(), 1);
        assert_eq!(ctx.lock().channels["inproc://churn"].subscribers.len(), 1);

        for n in 0..1000 {
            drop(ctx.subscribe(&format!("inproc://churn-{}", n)).unwrap());
        }
        assert_eq!(ctx.endpoints(), 1);

        let live = ctx.subscribe("inproc://kept").unwrap();
        let mut socket = PubSocket::new(&ctx);
        socket.bind("inproc://bound").unwrap();
        drop(ctx.subscribe("inproc://gone").unwrap());
        assert_eq!(ctx.endpoints(), 3);

        socket.unbind("inproc://bound").unwrap();
        assert_eq!(ctx.endpoints(), 2);
        drop(live);
        assert_eq!(ctx.publish("inproc://kept", b"x"), 0);
        assert_eq!(ctx.endpoints(), 1);
    }

    #[test]
    fn test_subscriber_keeps_messages_after_unbind() {
        let ctx = Context::new();
        let sub = ctx.subscribe("inproc://q").unwrap();
        let mut socket = PubSocket::new(&ctx);
        socket.bind("inproc://q").unwrap();
        socket.send(b"one").unwrap();
        socket.unbind("inproc://q").unwrap();

        assert!(!ctx.is_bound("inproc://q"));
        assert_eq!(sub.pending(), 1);
        assert_eq!(sub.try_recv(), Some(b"one".to_vec()));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&Mode::Connect).unwrap(), r#""connect""#);
        assert_eq!(Mode::default(), Mode::Bind);
        assert_eq!(Mode::Bind.to_string(), "bind");
    }
}
