//! Command pipelining: send many, flush once, drain replies in FIFO order.

use bytes::Bytes;

use crate::client::{arg, int_arg, Client, Mode};
use crate::commands::Command;
use crate::frame::Frame;
use crate::reply;
use crate::{Error, Result};

/// A claim ticket for one queued command's reply, redeemable after
/// [`Pipeline::sync`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pending {
    index: usize,
}

impl Client {
    /// Starts buffering commands instead of executing them one by one.
    /// Nothing reaches the server until the pipeline syncs.
    pub fn pipelined(&mut self) -> Result<Pipeline<'_>> {
        self.check_simple_mode()?;
        self.mode = Mode::Pipelining;
        Ok(Pipeline {
            client: self,
            queued: 0,
            replies: Vec::new(),
            synced: false,
        })
    }
}

/// Buffers commands on the client's connection and drains their replies in
/// submission order.
///
/// The borrowed client stays in pipelining mode while replies are unread;
/// dropping a pipeline without syncing leaves it fenced until the connection
/// is closed.
pub struct Pipeline<'a> {
    client: &'a mut Client,
    queued: usize,
    replies: Vec<Option<Result<Frame>>>,
    synced: bool,
}

impl Pipeline<'_> {
    /// Queues any command. The reply is owed at this pipeline position.
    pub async fn command(&mut self, name: &str, args: &[&str]) -> Result<Pending> {
        let args: Vec<Bytes> = args.iter().map(|a| arg(a)).collect();
        self.client.ensure_connected().await?;
        self.client.connection.send_raw(name, &args).await?;
        self.claim()
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<Pending> {
        self.enqueue(Command::Set, vec![arg(key), arg(value)]).await
    }

    pub async fn get(&mut self, key: &str) -> Result<Pending> {
        self.enqueue(Command::Get, vec![arg(key)]).await
    }

    pub async fn incr(&mut self, key: &str) -> Result<Pending> {
        self.enqueue(Command::Incr, vec![arg(key)]).await
    }

    pub async fn incr_by(&mut self, key: &str, increment: i64) -> Result<Pending> {
        self.enqueue(Command::IncrBy, vec![arg(key), int_arg(increment)])
            .await
    }

    pub async fn del(&mut self, keys: &[&str]) -> Result<Pending> {
        self.enqueue(Command::Del, keys.iter().map(|k| arg(k)).collect())
            .await
    }

    pub async fn expire(&mut self, key: &str, seconds: i64) -> Result<Pending> {
        self.enqueue(Command::Expire, vec![arg(key), int_arg(seconds)])
            .await
    }

    pub async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<Pending> {
        self.enqueue(Command::HSet, vec![arg(key), arg(field), arg(value)])
            .await
    }

    pub async fn hget(&mut self, key: &str, field: &str) -> Result<Pending> {
        self.enqueue(Command::HGet, vec![arg(key), arg(field)]).await
    }

    pub async fn lpush(&mut self, key: &str, value: &str) -> Result<Pending> {
        self.enqueue(Command::LPush, vec![arg(key), arg(value)]).await
    }

    pub async fn rpush(&mut self, key: &str, value: &str) -> Result<Pending> {
        self.enqueue(Command::RPush, vec![arg(key), arg(value)]).await
    }

    pub async fn sadd(&mut self, key: &str, member: &str) -> Result<Pending> {
        self.enqueue(Command::SAdd, vec![arg(key), arg(member)]).await
    }

    pub async fn ping(&mut self) -> Result<Pending> {
        self.enqueue(Command::Ping, Vec::new()).await
    }

    async fn enqueue(&mut self, command: Command, args: Vec<Bytes>) -> Result<Pending> {
        self.client.ensure_connected().await?;
        self.client.connection.send(command, &args).await?;
        self.claim()
    }

    fn claim(&mut self) -> Result<Pending> {
        let pending = Pending { index: self.queued };
        self.queued += 1;
        Ok(pending)
    }

    pub fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Flushes the buffered commands in one write, then reads exactly as
    /// many replies as were queued, in submission order. A failed slot is
    /// captured in place and does not abort the remaining slots.
    pub async fn sync(&mut self) -> Result<()> {
        if self.synced {
            return Ok(());
        }

        let drained = self.client.connection.get_all(0).await?;
        self.replies = drained
            .into_iter()
            .map(|slot| match slot {
                // A server error reply belongs to its slot, not to the drain.
                Ok(Frame::Error(msg)) => Some(Err(Error::Data(msg))),
                other => Some(other),
            })
            .collect();

        self.synced = true;
        self.client.mode = Mode::Simple;
        Ok(())
    }

    /// Redeems one claim ticket. Each reply can be taken once.
    pub fn reply(&mut self, pending: Pending) -> Result<Frame> {
        if !self.synced {
            return Err(Error::Data(
                "pipeline replies are not available before sync".to_string(),
            ));
        }

        match self.replies.get_mut(pending.index).and_then(Option::take) {
            Some(reply) => reply,
            None => Err(Error::Data(format!(
                "pipeline reply {} was already taken",
                pending.index
            ))),
        }
    }

    /// Convenience projection of [`reply`](Pipeline::reply) for integer
    /// replies.
    pub fn integer_reply(&mut self, pending: Pending) -> Result<i64> {
        self.reply(pending).and_then(reply::to_integer)
    }

    /// Syncs and hands back every reply in submission order.
    pub async fn drain(mut self) -> Result<Vec<Result<Frame>>> {
        self.sync().await?;
        Ok(self
            .replies
            .drain(..)
            .map(|slot| slot.unwrap_or_else(|| Err(Error::Data("reply taken".to_string()))))
            .collect())
    }
}

impl Drop for Pipeline<'_> {
    fn drop(&mut self) {
        // Leaving unread replies on the wire keeps the client fenced; only a
        // fully drained pipeline hands simple mode back.
        if self.client.connection.pending() == 0 {
            self.client.mode = Mode::Simple;
        }
    }
}
