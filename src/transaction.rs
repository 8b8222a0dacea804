//! MULTI/EXEC transactions with optimistic locking via WATCH.

use bytes::Bytes;

use crate::client::{arg, int_arg, str_args, Client, Mode};
use crate::commands::Command;
use crate::frame::Frame;
use crate::reply;
use crate::{Error, Result};

impl Client {
    /// Registers keys for optimistic locking. Must precede
    /// [`multi`](Client::multi): if any watched key changes before EXEC, the
    /// whole transaction aborts.
    pub async fn watch(&mut self, keys: &[&str]) -> Result<String> {
        let frame = self.execute(Command::Watch, str_args(keys)).await?;
        reply::to_status(frame)
    }

    /// Drops every watch registered on this connection.
    pub async fn unwatch(&mut self) -> Result<String> {
        let frame = self.execute(Command::Unwatch, Vec::new()).await?;
        reply::to_status(frame)
    }

    /// Opens a transaction. Commands queued on the returned handle execute
    /// atomically at [`Transaction::exec`].
    pub async fn multi(&mut self) -> Result<Transaction<'_>> {
        self.check_simple_mode()?;
        self.ensure_connected().await?;

        self.connection.send(Command::Multi, &[]).await?;
        let frame = self.connection.get_one().await?;
        reply::to_status(frame)?;

        self.mode = Mode::Queuing;
        Ok(Transaction {
            client: self,
            queued: 0,
        })
    }
}

/// A queuing transaction.
///
/// Every queued command is sent immediately; the server acknowledges each
/// with a lightweight `+QUEUED` status that is drained and dropped at EXEC
/// time. Real results only materialise in the EXEC reply, one frame per
/// queued command in queuing order.
///
/// Dropping a transaction without `exec` or `discard` leaves the client
/// fenced in queuing mode; only those two calls — or closing the connection —
/// return it to simple mode.
pub struct Transaction<'a> {
    client: &'a mut Client,
    queued: usize,
}

impl Transaction<'_> {
    /// Queues any command.
    pub async fn command(&mut self, name: &str, args: &[&str]) -> Result<()> {
        let args: Vec<Bytes> = args.iter().map(|a| arg(a)).collect();
        self.client.connection.send_raw(name, &args).await?;
        self.queued += 1;
        Ok(())
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.enqueue(Command::Set, vec![arg(key), arg(value)]).await
    }

    pub async fn get(&mut self, key: &str) -> Result<()> {
        self.enqueue(Command::Get, vec![arg(key)]).await
    }

    pub async fn incr(&mut self, key: &str) -> Result<()> {
        self.enqueue(Command::Incr, vec![arg(key)]).await
    }

    pub async fn del(&mut self, keys: &[&str]) -> Result<()> {
        self.enqueue(Command::Del, str_args(keys)).await
    }

    pub async fn expire(&mut self, key: &str, seconds: i64) -> Result<()> {
        self.enqueue(Command::Expire, vec![arg(key), int_arg(seconds)])
            .await
    }

    pub async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        self.enqueue(Command::HSet, vec![arg(key), arg(field), arg(value)])
            .await
    }

    pub async fn lpush(&mut self, key: &str, value: &str) -> Result<()> {
        self.enqueue(Command::LPush, vec![arg(key), arg(value)]).await
    }

    pub async fn sadd(&mut self, key: &str, member: &str) -> Result<()> {
        self.enqueue(Command::SAdd, vec![arg(key), arg(member)]).await
    }

    async fn enqueue(&mut self, command: Command, args: Vec<Bytes>) -> Result<()> {
        self.client.connection.send(command, &args).await?;
        self.queued += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Runs the queued commands atomically.
    ///
    /// Returns one frame per queued command in queuing order. If a watched
    /// key changed since WATCH, the server answers a null array and this
    /// surfaces as [`Error::TransactionAborted`] — distinguishable from both
    /// connection and data errors so the caller can retry the whole
    /// transaction.
    pub async fn exec(self) -> Result<Vec<Frame>> {
        let queued = self.queued;
        let result = async {
            self.client.connection.send(Command::Exec, &[]).await?;
            self.client.connection.flush().await?;

            // The +QUEUED acknowledgement of every queued command arrives
            // before the EXEC reply; drain and drop them.
            for _ in 0..queued {
                let _ = self.client.connection.read_reply().await?;
            }

            self.client.connection.read_reply().await
        }
        .await;

        // EXEC terminates the transaction server-side whatever the outcome.
        self.client.mode = Mode::Simple;

        match result {
            Ok(Frame::Null) => Err(Error::TransactionAborted),
            Ok(Frame::Array(frames)) => Ok(frames),
            Ok(Frame::Error(msg)) => Err(Error::Data(msg)),
            Ok(other) => Err(Error::Data(format!(
                "unexpected reply: expected exec array, got {}",
                other
            ))),
            Err(err) => Err(err),
        }
    }

    /// Abandons the queued commands without running them.
    pub async fn discard(self) -> Result<String> {
        let queued = self.queued;
        let result = async {
            self.client.connection.send(Command::Discard, &[]).await?;
            self.client.connection.flush().await?;

            for _ in 0..queued {
                let _ = self.client.connection.read_reply().await?;
            }

            self.client.connection.read_reply().await
        }
        .await;

        self.client.mode = Mode::Simple;
        reply::to_status(result?)
    }
}
