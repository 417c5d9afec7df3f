//! Publisher session: packing plus a transport.
//!
//! A [`Publisher`] owns a [`Transport`], the [`PackOptions`] and the
//! connection state. A session is either connected (client) or bound
//! (server), never both; a second connect or bind while one is active is
//! rejected before the transport is touched.
//!
//! Everything that happens is reported through an [`EventSink`]:
//! connection changes as [`Event::Status`], failures as [`Event::Error`],
//! and the byte count of each successful send as [`Event::Sent`]. Errors are
//! also logged and returned to the caller; none of them is retried.
//!
//! ```rust
//! use pubpack::{values, Context, Event, Mode, Publisher};
//!
//! let ctx = Context::new();
//! let sub = ctx.subscribe("inproc://meters").unwrap();
//!
//! let mut publisher = Publisher::with_context(&ctx);
//! publisher.set_format("[C]");
//! publisher.bind("inproc://meters").unwrap();
//! assert_eq!(publisher.send(&values![1, 2, 3]).unwrap(), 3);
//!
//! assert_eq!(sub.try_recv(), Some(vec![1, 2, 3]));
//! assert_eq!(
//!     publisher.sink().as_slice(),
//!     &[Event::Status { connected: true, mode: Some(Mode::Bind) }, Event::Sent(3)]
//! );
//! ```

use crate::options::SessionArgs;
use crate::transport::{Context, Mode, PubSocket, Transport};
use crate::{Error, PackOptions, Packer, Result, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// Something a host gets told about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Connection state changed.
    Status {
        connected: bool,
        mode: Option<Mode>,
    },
    /// A format, state or transport error occurred.
    Error(String),
    /// Bytes handed to the transport by one send.
    Sent(usize),
}

/// Receiver of [`Event`]s.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

/// Discards every event.
impl EventSink for () {
    fn emit(&mut self, _event: Event) {}
}

/// Adapts a closure into an [`EventSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(Event)> EventSink for FnSink<F> {
    fn emit(&mut self, event: Event) {
        (self.0)(event)
    }
}

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSink")
    }
}

/// Connection state of a session.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Connection {
    #[default]
    Disconnected,
    Connected(String),
    Bound(String),
}

impl Connection {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Connection::Disconnected)
    }

    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Connection::Disconnected => None,
            Connection::Connected(_) => Some(Mode::Connect),
            Connection::Bound(_) => Some(Mode::Bind),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Connection::Disconnected => None,
            Connection::Connected(endpoint) | Connection::Bound(endpoint) => Some(endpoint),
        }
    }
}

/// A publishing session.
#[derive(Debug)]
pub struct Publisher<T: Transport = PubSocket, S: EventSink = Vec<Event>> {
    transport: T,
    packer: Packer,
    connection: Connection,
    sink: S,
}

impl Publisher<PubSocket, Vec<Event>> {
    /// A session over a fresh [`PubSocket`] on `ctx`, collecting events
    /// into a `Vec`.
    pub fn with_context(ctx: &Context) -> Self {
        Publisher::new(PubSocket::new(ctx), PackOptions::default(), Vec::new())
    }
}

impl<T: Transport, S: EventSink> Publisher<T, S> {
    pub fn new(transport: T, options: PackOptions, sink: S) -> Self {
        Publisher {
            transport,
            packer: Packer::new(options),
            connection: Connection::Disconnected,
            sink,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn is_active(&self) -> bool {
        self.connection.is_active()
    }

    pub fn options(&self) -> &PackOptions {
        self.packer.options()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Replaces the format specification used by later sends.
    pub fn set_format(&mut self, format: &str) {
        self.packer.options_mut().format = format.into();
        debug!(format, "format set");
    }

    /// Connects to `endpoint` as a client.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyActive`] if the session is connected or bound, or the
    /// transport's error if the connect fails.
    pub fn connect(&mut self, endpoint: &str) -> Result<()> {
        self.attach(endpoint, Mode::Connect)
    }

    /// Binds `endpoint` as a server.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyActive`] if the session is connected or bound, or the
    /// transport's error if the bind fails.
    pub fn bind(&mut self, endpoint: &str) -> Result<()> {
        self.attach(endpoint, Mode::Bind)
    }

    /// Tears down the active connection or binding. No-op when inactive.
    ///
    /// # Errors
    ///
    /// The transport's error; the session then stays active.
    pub fn disconnect(&mut self) -> Result<()> {
        self.detach()
    }

    /// Same as [`Publisher::disconnect`]: either mode is torn down.
    pub fn unbind(&mut self) -> Result<()> {
        self.detach()
    }

    /// Packs `values` with the current format and publishes the result.
    ///
    /// Returns the number of bytes the transport accepted.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] when inactive, a format error when packing fails
    /// (nothing is sent), or the transport's send error.
    pub fn send(&mut self, values: &[Value]) -> Result<usize> {
        if !self.connection.is_active() {
            return Err(self.report(Error::NotReady));
        }

        let packed = match self.packer.pack(values) {
            Ok(packed) => packed,
            Err(err) => return Err(self.report(err)),
        };

        match self.transport.send(packed.bytes()) {
            Ok(sent) => {
                debug!(sent, consumed = packed.consumed(), "message published");
                self.sink.emit(Event::Sent(sent));
                Ok(sent)
            }
            Err(err) => Err(self.report(err)),
        }
    }

    /// Applies load-time arguments: the format first, then connect or bind.
    ///
    /// ```rust
    /// use pubpack::{values, Context, Publisher};
    ///
    /// let ctx = Context::new();
    /// let mut publisher = Publisher::with_context(&ctx);
    /// publisher.load(&values!["inproc://args", "[cf]", "connect"]).unwrap();
    /// assert_eq!(publisher.options().format.as_str(), "[cf]");
    /// assert_eq!(publisher.connection().endpoint(), Some("inproc://args"));
    /// ```
    ///
    /// # Errors
    ///
    /// Whatever the connect or bind returns.
    pub fn load(&mut self, args: &[Value]) -> Result<()> {
        let args = SessionArgs::from_values(args);
        info!(?args, "loading publisher");
        if let Some(format) = &args.format {
            self.set_format(format);
        }
        match &args.endpoint {
            Some(endpoint) => self.attach(endpoint, args.mode),
            None => Ok(()),
        }
    }

    fn attach(&mut self, endpoint: &str, mode: Mode) -> Result<()> {
        if let Some(active) = self.connection.mode() {
            let err = Error::AlreadyActive {
                mode: active,
                endpoint: self.connection.endpoint().unwrap_or_default().to_string(),
            };
            return Err(self.report(err));
        }

        let attached = match mode {
            Mode::Connect => self.transport.connect(endpoint),
            Mode::Bind => self.transport.bind(endpoint),
        };
        if let Err(err) = attached {
            let err = self.report(err);
            self.sink.emit(Event::Status {
                connected: false,
                mode: None,
            });
            return Err(err);
        }

        self.connection = match mode {
            Mode::Connect => Connection::Connected(endpoint.to_string()),
            Mode::Bind => Connection::Bound(endpoint.to_string()),
        };
        info!(%mode, endpoint, "publisher attached");
        self.sink.emit(Event::Status {
            connected: true,
            mode: Some(mode),
        });
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        let Some(mode) = self.connection.mode() else {
            return Ok(());
        };
        let endpoint = self
            .transport
            .last_endpoint()
            .or(self.connection.endpoint())
            .unwrap_or_default()
            .to_string();

        let detached = match mode {
            Mode::Connect => self.transport.disconnect(&endpoint),
            Mode::Bind => self.transport.unbind(&endpoint),
        };
        if let Err(err) = detached {
            return Err(self.report(err));
        }

        self.connection = Connection::Disconnected;
        info!(%mode, %endpoint, "publisher detached");
        self.sink.emit(Event::Status {
            connected: false,
            mode: None,
        });
        Ok(())
    }

    fn report(&mut self, err: Error) -> Error {
        warn!(error = %err, kind = ?err.kind(), "publisher error");
        self.sink.emit(Event::Error(err.to_string()));
        err
    }
}

impl<T: Transport, S: EventSink> Drop for Publisher<T, S> {
    fn drop(&mut self) {
        // already reported through the sink
        let _ = self.detach();
    }
}
