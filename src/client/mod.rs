mod hashes;
mod keys;
mod lists;
mod pubsub;
mod scripting;
mod server;
mod sets;
mod sorted_sets;
mod strings;

pub use keys::ScanParams;
pub use pubsub::{Message, Subscription};
pub use strings::{SetCondition, SetExpiry};

use bytes::Bytes;
use tracing::debug;

use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::reply;
use crate::{Error, Result};

/// Execution mode, consulted once per simple-command dispatch.
///
/// A client queuing a transaction or holding unread pipeline replies must
/// not interleave simple commands, or reply pairing on the shared connection
/// falls apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Mode {
    Simple,
    Queuing,
    Pipelining,
}

/// One logical caller talking to one server over one connection.
///
/// Commands are grouped in the sibling modules by key family; every one of
/// them funnels through [`execute`](Client::execute), sending the encoded
/// command and projecting the reply through a typed accessor.
pub struct Client {
    pub(crate) connection: Connection,
    pub(crate) mode: Mode,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Client {
        Client {
            connection: Connection::new(config.clone()),
            mode: Mode::Simple,
            config,
        }
    }

    /// Dials eagerly. Optional: the first command connects lazily anyway.
    pub async fn connect(&mut self) -> Result<()> {
        self.ensure_connected().await
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn is_broken(&self) -> bool {
        self.connection.is_broken()
    }

    /// Releases the socket. The client can be reused; the next command
    /// reconnects and re-runs the AUTH/SELECT handshake.
    pub fn close(&mut self) {
        self.connection.close();
        self.mode = Mode::Simple;
    }

    /// Whether another caller could use this client as-is: connected, not
    /// broken, in simple mode and with no replies owed on the wire. An
    /// abandoned transaction or unsynced pipeline fails this check.
    pub(crate) fn is_reusable(&self) -> bool {
        self.connection.is_connected()
            && !self.connection.is_broken()
            && self.mode == Mode::Simple
            && self.connection.pending() == 0
    }

    /// Escape hatch for commands without a dedicated builder. Returns the
    /// raw reply frame for the caller to project.
    pub async fn command(&mut self, name: &str, args: &[&str]) -> Result<Frame> {
        self.check_simple_mode()?;
        self.ensure_connected().await?;
        let args: Vec<Bytes> = args.iter().map(|a| arg(a)).collect();
        self.connection.send_raw(name, &args).await?;
        self.connection.get_one().await
    }

    pub(crate) async fn execute(&mut self, command: Command, args: Vec<Bytes>) -> Result<Frame> {
        self.check_simple_mode()?;
        self.ensure_connected().await?;
        self.connection.send(command, &args).await?;
        self.connection.get_one().await
    }

    /// Variant of [`execute`](Client::execute) for commands that may park for
    /// a long server-side wait: the read deadline is suspended for the call
    /// and restored on every exit path.
    pub(crate) async fn execute_blocking(
        &mut self,
        command: Command,
        args: Vec<Bytes>,
    ) -> Result<Frame> {
        self.check_simple_mode()?;
        self.ensure_connected().await?;

        let saved = self.connection.suspend_read_timeout();
        let result = async {
            self.connection.send(command, &args).await?;
            self.connection.get_one().await
        }
        .await;
        self.connection.restore_read_timeout(saved);

        result
    }

    pub(crate) fn check_simple_mode(&self) -> Result<()> {
        match self.mode {
            Mode::Simple => Ok(()),
            Mode::Queuing => Err(Error::Data(
                "cannot use simple commands while a transaction is queuing; \
                 finish it with EXEC or DISCARD"
                    .to_string(),
            )),
            Mode::Pipelining => Err(Error::Data(
                "cannot use simple commands while a pipeline holds unread replies".to_string(),
            )),
        }
    }

    pub(crate) async fn ensure_connected(&mut self) -> Result<()> {
        if self.connection.is_connected() {
            return Ok(());
        }

        self.connection.connect().await?;

        // Authentication and database selection are ordinary commands issued
        // right after the dial, before anything else goes on the wire.
        if !self.config.password.is_empty() {
            self.connection
                .send(Command::Auth, &[arg(&self.config.password)])
                .await?;
            let frame = self.connection.get_one().await?;
            reply::to_status(frame)?;
            debug!(connection_id = %self.connection.id, "authenticated");
        }
        if self.config.db != 0 {
            self.connection
                .send(Command::Select, &[int_arg(self.config.db as i64)])
                .await?;
            let frame = self.connection.get_one().await?;
            reply::to_status(frame)?;
            debug!(connection_id = %self.connection.id, db = self.config.db, "database selected");
        }

        Ok(())
    }
}

pub(crate) fn arg(value: &str) -> Bytes {
    Bytes::copy_from_slice(value.as_bytes())
}

pub(crate) fn int_arg(value: i64) -> Bytes {
    Bytes::from(value.to_string())
}

pub(crate) fn float_arg(value: f64) -> Bytes {
    Bytes::from(value.to_string())
}

pub(crate) fn str_args(values: &[&str]) -> Vec<Bytes> {
    values.iter().map(|v| arg(v)).collect()
}
