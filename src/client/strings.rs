//! String commands.
//!
//! Ref: <https://redis.io/docs/latest/commands/?group=string>

use bytes::Bytes;

use super::{arg, float_arg, int_arg, str_args, Client};
use crate::commands::Command;
use crate::reply;
use crate::Result;

/// Conditional form of SET: only set when the key is absent (NX) or
/// present (XX).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetCondition {
    NotExists,
    Exists,
}

/// Expiry attached to a conditional SET, in seconds (EX) or
/// milliseconds (PX).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetExpiry {
    Seconds(i64),
    Millis(i64),
}

impl Client {
    /// Sets `key` to `value`. Always answers `OK`.
    pub async fn set(&mut self, key: &str, value: &str) -> Result<String> {
        let frame = self.execute(Command::Set, vec![arg(key), arg(value)]).await?;
        reply::to_status(frame)
    }

    /// SET with NX/XX and EX/PX options. Returns `None` when the condition
    /// was not met (the server answers a null bulk).
    pub async fn set_with_options(
        &mut self,
        key: &str,
        value: &str,
        condition: Option<SetCondition>,
        expiry: Option<SetExpiry>,
    ) -> Result<Option<String>> {
        let mut args = vec![arg(key), arg(value)];
        match condition {
            Some(SetCondition::NotExists) => args.push(arg("NX")),
            Some(SetCondition::Exists) => args.push(arg("XX")),
            None => {}
        }
        match expiry {
            Some(SetExpiry::Seconds(seconds)) => {
                args.push(arg("EX"));
                args.push(int_arg(seconds));
            }
            Some(SetExpiry::Millis(millis)) => {
                args.push(arg("PX"));
                args.push(int_arg(millis));
            }
            None => {}
        }

        let frame = self.execute(Command::Set, args).await?;
        reply::to_string(frame)
    }

    /// Gets the value of `key`, or `None` when the key does not exist.
    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let frame = self.execute(Command::Get, vec![arg(key)]).await?;
        reply::to_string(frame)
    }

    /// Binary-safe variant of [`get`](Client::get).
    pub async fn get_bytes(&mut self, key: &str) -> Result<Option<Bytes>> {
        let frame = self.execute(Command::Get, vec![arg(key)]).await?;
        reply::to_bulk(frame)
    }

    /// Atomically sets `key` and returns its previous value.
    pub async fn getset(&mut self, key: &str, value: &str) -> Result<Option<String>> {
        let frame = self
            .execute(Command::GetSet, vec![arg(key), arg(value)])
            .await?;
        reply::to_string(frame)
    }

    /// Sets `key` only when absent. Returns true when the value was set.
    pub async fn setnx(&mut self, key: &str, value: &str) -> Result<bool> {
        let frame = self
            .execute(Command::SetNx, vec![arg(key), arg(value)])
            .await?;
        reply::to_bool(frame)
    }

    /// Sets `key` with a time to live in seconds.
    pub async fn setex(&mut self, key: &str, seconds: i64, value: &str) -> Result<String> {
        let frame = self
            .execute(Command::SetEx, vec![arg(key), int_arg(seconds), arg(value)])
            .await?;
        reply::to_status(frame)
    }

    /// Sets `key` with a time to live in milliseconds.
    pub async fn psetex(&mut self, key: &str, millis: i64, value: &str) -> Result<String> {
        let frame = self
            .execute(Command::PSetEx, vec![arg(key), int_arg(millis), arg(value)])
            .await?;
        reply::to_status(frame)
    }

    /// Appends to the string at `key`, returning the new length.
    pub async fn append(&mut self, key: &str, value: &str) -> Result<i64> {
        let frame = self
            .execute(Command::Append, vec![arg(key), arg(value)])
            .await?;
        reply::to_integer(frame)
    }

    pub async fn strlen(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::StrLen, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    pub async fn getrange(&mut self, key: &str, start: i64, end: i64) -> Result<Option<String>> {
        let frame = self
            .execute(Command::GetRange, vec![arg(key), int_arg(start), int_arg(end)])
            .await?;
        reply::to_string(frame)
    }

    /// Overwrites part of the string at `key` starting at `offset`; returns
    /// the resulting length.
    pub async fn setrange(&mut self, key: &str, offset: i64, value: &str) -> Result<i64> {
        let frame = self
            .execute(
                Command::SetRange,
                vec![arg(key), int_arg(offset), arg(value)],
            )
            .await?;
        reply::to_integer(frame)
    }

    /// Increments the integer at `key` by one; returns the new value.
    pub async fn incr(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::Incr, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    pub async fn incr_by(&mut self, key: &str, increment: i64) -> Result<i64> {
        let frame = self
            .execute(Command::IncrBy, vec![arg(key), int_arg(increment)])
            .await?;
        reply::to_integer(frame)
    }

    /// Floating-point increment. The server answers the new value as bulk
    /// text, parsed here.
    pub async fn incr_by_float(&mut self, key: &str, increment: f64) -> Result<f64> {
        let frame = self
            .execute(Command::IncrByFloat, vec![arg(key), float_arg(increment)])
            .await?;
        reply::to_float(frame)
    }

    pub async fn decr(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::Decr, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    pub async fn decr_by(&mut self, key: &str, decrement: i64) -> Result<i64> {
        let frame = self
            .execute(Command::DecrBy, vec![arg(key), int_arg(decrement)])
            .await?;
        reply::to_integer(frame)
    }

    /// Fetches several keys at once; missing keys yield `None` in place.
    pub async fn mget(&mut self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let frame = self.execute(Command::MGet, str_args(keys)).await?;
        reply::to_optional_strings(frame)
    }

    /// Sets several `(key, value)` pairs atomically.
    pub async fn mset(&mut self, pairs: &[(&str, &str)]) -> Result<String> {
        let frame = self.execute(Command::MSet, pair_args(pairs)).await?;
        reply::to_status(frame)
    }

    /// MSET that performs no operation at all if any key already exists.
    /// Returns true when every key was set.
    pub async fn msetnx(&mut self, pairs: &[(&str, &str)]) -> Result<bool> {
        let frame = self.execute(Command::MSetNx, pair_args(pairs)).await?;
        reply::to_bool(frame)
    }
}

fn pair_args(pairs: &[(&str, &str)]) -> Vec<Bytes> {
    let mut args = Vec::with_capacity(pairs.len() * 2);
    for (key, value) in pairs {
        args.push(arg(key));
        args.push(arg(value));
    }
    args
}
