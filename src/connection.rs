use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::commands::Command;
use crate::config::Config;
use crate::frame::{self, Frame};
use crate::{Error, Result};

/// One socket to one server.
///
/// All reads and writes are strictly sequential; replies arrive in FIFO
/// order matching command submission, which is what the pipeline and
/// transaction layers rely on when they drain.
///
/// `broken` is sticky: once any I/O operation fails, every later read fails
/// fast without touching the network, until the connection is explicitly
/// closed and re-dialed.
pub struct Connection {
    config: Config,
    stream: Option<Framed<TcpStream, FrameCodec>>,
    broken: bool,
    // Commands fed to the write buffer but not yet read back. Never goes
    // negative: reads decrement with saturation.
    pending: usize,
    // Effective bound on one reply read. `None` means wait forever, used by
    // blocking commands (BLPOP, SUBSCRIBE, EVAL) for their own duration.
    read_timeout: Option<Duration>,
    pub(crate) id: Uuid,
}

impl Connection {
    pub fn new(config: Config) -> Connection {
        let read_timeout = Some(config.read_timeout);
        Connection {
            config,
            stream: None,
            broken: false,
            pending: 0,
            read_timeout,
            id: Uuid::new_v4(),
        }
    }

    /// Dials the server if not already connected. Reconnecting clears the
    /// broken flag and the pending count.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let connecting = TcpStream::connect(self.config.addr());
        let stream = match timeout(self.config.connect_timeout, connecting).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(Error::Connection(err.to_string())),
            Err(_) => {
                return Err(Error::Connection(format!(
                    "connecting to {}:{} timed out",
                    self.config.host, self.config.port
                )))
            }
        };
        stream.set_nodelay(true)?;

        debug!(
            connection_id = %self.id,
            "connected to {}:{}", self.config.host, self.config.port
        );

        self.stream = Some(Framed::new(stream, FrameCodec));
        self.broken = false;
        self.pending = 0;
        self.read_timeout = Some(self.config.read_timeout);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Encodes one command into the output buffer without flushing it.
    ///
    /// Connects lazily; a dial failure surfaces as a connection error and
    /// leaves the pending count untouched.
    pub async fn send(&mut self, command: Command, args: &[Bytes]) -> Result<()> {
        self.send_raw(command.name(), args).await
    }

    /// Same as [`send`](Self::send) for commands outside the built-in set.
    pub async fn send_raw(&mut self, command: &str, args: &[Bytes]) -> Result<()> {
        self.connect().await?;

        let request = frame::command(command, args);
        trace!(connection_id = %self.id, command, "send");

        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(Error::Connection("socket is closed".to_string())),
        };
        if let Err(err) = stream.feed(request).await {
            self.broken = true;
            return Err(err);
        }

        self.pending += 1;
        Ok(())
    }

    /// Forces buffered writes onto the socket.
    pub async fn flush(&mut self) -> Result<()> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(()),
        };
        if let Err(err) = stream.flush().await {
            self.broken = true;
            return Err(err);
        }
        Ok(())
    }

    /// Reads exactly one reply, bounded by the effective read deadline.
    ///
    /// A broken connection refuses immediately. EOF, expiry and framing
    /// corruption all mark the connection broken.
    pub async fn read_reply(&mut self) -> Result<Frame> {
        if self.broken {
            return Err(Error::Connection(
                "attempting to read from a broken connection".to_string(),
            ));
        }

        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(Error::Connection("socket is closed".to_string())),
        };

        self.pending = self.pending.saturating_sub(1);

        let next = match self.read_timeout {
            Some(limit) => match timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    self.broken = true;
                    return Err(Error::Connection("reply read timed out".to_string()));
                }
            },
            None => stream.next().await,
        };

        match next {
            Some(Ok(frame)) => {
                trace!(connection_id = %self.id, reply = %frame, "read");
                Ok(frame)
            }
            Some(Err(err)) => {
                self.broken = true;
                Err(err)
            }
            None => {
                self.broken = true;
                Err(Error::Connection("connection closed by server".to_string()))
            }
        }
    }

    /// Flushes and reads the one reply owed for the last sent command.
    pub async fn get_one(&mut self) -> Result<Frame> {
        self.flush().await?;
        self.read_reply().await
    }

    /// Flushes, then drains replies until only `keep` remain owed.
    ///
    /// A per-reply failure is captured in its slot so one bad reply does not
    /// abort collection of the rest; once the connection breaks, the
    /// remaining slots fill with fenced errors without touching the network.
    pub async fn get_all(&mut self, keep: usize) -> Result<Vec<Result<Frame>>> {
        self.flush().await?;

        let owed = self.pending.saturating_sub(keep);
        let mut replies = Vec::with_capacity(owed);
        for _ in 0..owed {
            replies.push(self.read_reply().await);
        }
        Ok(replies)
    }

    /// Suspends the read deadline for a blocking wait. The caller restores
    /// the returned value on every exit path.
    pub(crate) fn suspend_read_timeout(&mut self) -> Option<Duration> {
        self.read_timeout.take()
    }

    pub(crate) fn restore_read_timeout(&mut self, saved: Option<Duration>) {
        self.read_timeout = saved;
    }

    pub(crate) fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// Releases the socket. Idempotent; the broken flag survives until the
    /// next connect so a closed-because-broken connection stays fenced.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(connection_id = %self.id, "connection closed");
        }
        self.pending = 0;
    }
}
