//! Publish/subscribe.
//!
//! A subscription takes the connection out of request/reply mode: the server
//! pushes messages whenever it likes, so the read deadline is suspended for
//! the whole subscription and restored when it ends. Dropping a subscription
//! without unsubscribing leaves the server-side state unknown, so the
//! connection is marked broken and will be re-dialed on next use.

use std::time::Duration;

use super::{arg, str_args, Client};
use crate::commands::Command;
use crate::frame::Frame;
use crate::reply;
use crate::{Error, Result};

/// One message pushed on a subscribed channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub channel: String,
    pub payload: String,
}

impl Client {
    /// Posts a message; returns how many subscribers received it.
    pub async fn publish(&mut self, channel: &str, message: &str) -> Result<i64> {
        let frame = self
            .execute(Command::Publish, vec![arg(channel), arg(message)])
            .await?;
        reply::to_integer(frame)
    }

    /// Subscribes to channels and hands back the message stream. The client
    /// is exclusively parked in subscription mode until the subscription is
    /// consumed by [`Subscription::unsubscribe`] or dropped.
    pub async fn subscribe(&mut self, channels: &[&str]) -> Result<Subscription<'_>> {
        self.check_simple_mode()?;
        self.ensure_connected().await?;

        let saved = self.connection.suspend_read_timeout();

        let confirmed = async {
            self.connection
                .send(Command::Subscribe, &str_args(channels))
                .await?;
            self.connection.flush().await?;

            // One confirmation per channel before any message flows.
            for _ in 0..channels.len() {
                let frame = self.connection.read_reply().await?;
                confirmation_kind(&frame, "subscribe")?;
            }
            Ok(())
        }
        .await;

        if let Err(err) = confirmed {
            self.connection.restore_read_timeout(saved);
            return Err(err);
        }

        Ok(Subscription {
            client: self,
            saved_timeout: saved,
            active: true,
        })
    }
}

/// Exclusive borrow of a client parked in subscription mode.
pub struct Subscription<'a> {
    client: &'a mut Client,
    saved_timeout: Option<Duration>,
    active: bool,
}

impl Subscription<'_> {
    /// Waits for the next pushed message, indefinitely.
    pub async fn next_message(&mut self) -> Result<Message> {
        loop {
            let frame = self.client.connection.read_reply().await?;
            let mut items = reply::to_frames(frame)?;

            if items.len() != 3 {
                return Err(Error::Data(format!(
                    "unexpected push of {} elements",
                    items.len()
                )));
            }

            let payload = items.pop().expect("length checked");
            let channel = items.pop().expect("length checked");
            let kind = reply::to_status(items.pop().expect("length checked"))?;

            // Late subscribe/unsubscribe acknowledgements may interleave
            // with messages; skip anything that is not a message proper.
            if kind != "message" {
                continue;
            }

            return Ok(Message {
                channel: reply::to_status(channel)?,
                payload: reply::to_status(payload)?,
            });
        }
    }

    /// Leaves subscription mode cleanly: unsubscribes from everything and
    /// drains acknowledgements until the server reports no remaining
    /// subscriptions.
    pub async fn unsubscribe(mut self) -> Result<()> {
        let result = async {
            self.client
                .connection
                .send(Command::Unsubscribe, &[])
                .await?;
            self.client.connection.flush().await?;

            loop {
                let frame = self.client.connection.read_reply().await?;
                // Messages published before the server processed the
                // UNSUBSCRIBE may still be in flight; discard them.
                if matches!(push_kind(&frame).as_deref(), Some("message" | "pmessage")) {
                    continue;
                }
                if confirmation_kind(&frame, "unsubscribe")? == 0 {
                    return Ok(());
                }
            }
        }
        .await;

        if result.is_ok() {
            self.active = false;
        }
        result
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.client
            .connection
            .restore_read_timeout(self.saved_timeout);

        // An abandoned subscription leaves unread pushes on the wire; the
        // connection cannot be trusted for request/reply pairing anymore.
        if self.active {
            self.client.connection.mark_broken();
        }
    }
}

// The first element of any push names its kind: "message", "pmessage", or
// a subscribe/unsubscribe acknowledgement.
fn push_kind(frame: &Frame) -> Option<String> {
    let items = match frame {
        Frame::Array(items) => items,
        _ => return None,
    };
    match items.first() {
        Some(Frame::Simple(kind)) => Some(kind.clone()),
        Some(Frame::Bulk(bytes)) => String::from_utf8(bytes.to_vec()).ok(),
        _ => None,
    }
}

// Confirmations are `[kind, channel, remaining-subscription-count]`.
fn confirmation_kind(frame: &Frame, expected: &str) -> Result<i64> {
    let items = match frame {
        Frame::Array(items) if items.len() == 3 => items,
        other => {
            return Err(Error::Data(format!(
                "unexpected subscription acknowledgement: {}",
                other
            )))
        }
    };

    let kind = reply::to_status(items[0].clone())?;
    if kind != expected {
        return Err(Error::Data(format!(
            "unexpected subscription acknowledgement kind: {:?}",
            kind
        )));
    }

    reply::to_integer(items[2].clone())
}
