//! List commands, including the blocking pops.
//!
//! Ref: <https://redis.io/docs/latest/commands/?group=list>

use super::{arg, int_arg, Client};
use crate::commands::Command;
use crate::reply;
use crate::Result;

impl Client {
    /// Prepends values; returns the list length afterwards.
    pub async fn lpush(&mut self, key: &str, values: &[&str]) -> Result<i64> {
        self.push(Command::LPush, key, values).await
    }

    /// Appends values; returns the list length afterwards.
    pub async fn rpush(&mut self, key: &str, values: &[&str]) -> Result<i64> {
        self.push(Command::RPush, key, values).await
    }

    /// LPUSH that does nothing unless the list already exists.
    pub async fn lpushx(&mut self, key: &str, values: &[&str]) -> Result<i64> {
        self.push(Command::LPushX, key, values).await
    }

    /// RPUSH that does nothing unless the list already exists.
    pub async fn rpushx(&mut self, key: &str, values: &[&str]) -> Result<i64> {
        self.push(Command::RPushX, key, values).await
    }

    async fn push(&mut self, command: Command, key: &str, values: &[&str]) -> Result<i64> {
        let mut args = Vec::with_capacity(1 + values.len());
        args.push(arg(key));
        args.extend(values.iter().map(|v| arg(v)));

        let frame = self.execute(command, args).await?;
        reply::to_integer(frame)
    }

    pub async fn lpop(&mut self, key: &str) -> Result<Option<String>> {
        let frame = self.execute(Command::LPop, vec![arg(key)]).await?;
        reply::to_string(frame)
    }

    pub async fn rpop(&mut self, key: &str) -> Result<Option<String>> {
        let frame = self.execute(Command::RPop, vec![arg(key)]).await?;
        reply::to_string(frame)
    }

    pub async fn llen(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::LLen, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    /// Elements between `start` and `stop` inclusive; negative indexes count
    /// from the tail.
    pub async fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let frame = self
            .execute(Command::LRange, vec![arg(key), int_arg(start), int_arg(stop)])
            .await?;
        reply::to_strings(frame)
    }

    /// Trims the list so only the given range remains.
    pub async fn ltrim(&mut self, key: &str, start: i64, stop: i64) -> Result<String> {
        let frame = self
            .execute(Command::LTrim, vec![arg(key), int_arg(start), int_arg(stop)])
            .await?;
        reply::to_status(frame)
    }

    pub async fn lindex(&mut self, key: &str, index: i64) -> Result<Option<String>> {
        let frame = self
            .execute(Command::LIndex, vec![arg(key), int_arg(index)])
            .await?;
        reply::to_string(frame)
    }

    pub async fn lset(&mut self, key: &str, index: i64, value: &str) -> Result<String> {
        let frame = self
            .execute(Command::LSet, vec![arg(key), int_arg(index), arg(value)])
            .await?;
        reply::to_status(frame)
    }

    /// Removes up to `count` occurrences of `value`; the sign of `count`
    /// picks the scan direction. Returns how many were removed.
    pub async fn lrem(&mut self, key: &str, count: i64, value: &str) -> Result<i64> {
        let frame = self
            .execute(Command::LRem, vec![arg(key), int_arg(count), arg(value)])
            .await?;
        reply::to_integer(frame)
    }

    /// Atomically moves the tail of `src_key` to the head of `dest_key`.
    pub async fn rpoplpush(&mut self, src_key: &str, dest_key: &str) -> Result<Option<String>> {
        let frame = self
            .execute(Command::RPopLPush, vec![arg(src_key), arg(dest_key)])
            .await?;
        reply::to_string(frame)
    }

    /// Blocking LPOP over several lists. Waits up to `timeout_secs` on the
    /// server side (0 = forever); the local read deadline is suspended for
    /// the wait. `None` means the server timeout expired; otherwise the
    /// reply is the `[key, element]` pair that became available.
    pub async fn blpop(&mut self, timeout_secs: i64, keys: &[&str]) -> Result<Option<Vec<String>>> {
        self.blocking_pop(Command::BLPop, timeout_secs, keys).await
    }

    /// Blocking RPOP; see [`blpop`](Client::blpop).
    pub async fn brpop(&mut self, timeout_secs: i64, keys: &[&str]) -> Result<Option<Vec<String>>> {
        self.blocking_pop(Command::BRPop, timeout_secs, keys).await
    }

    async fn blocking_pop(
        &mut self,
        command: Command,
        timeout_secs: i64,
        keys: &[&str],
    ) -> Result<Option<Vec<String>>> {
        let mut args = Vec::with_capacity(keys.len() + 1);
        args.extend(keys.iter().map(|k| arg(k)));
        args.push(int_arg(timeout_secs));

        let frame = self.execute_blocking(command, args).await?;
        reply::to_strings_opt(frame)
    }
}
