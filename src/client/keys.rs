//! Generic key-space commands.
//!
//! Ref: <https://redis.io/docs/latest/commands/?group=generic>

use bytes::Bytes;

use super::{arg, int_arg, str_args, Client};
use crate::commands::Command;
use crate::reply::{self, ScanResult};
use crate::Result;

/// MATCH/COUNT modifiers for the SCAN family.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanParams {
    pub pattern: Option<String>,
    pub count: Option<i64>,
}

impl ScanParams {
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn append_to(&self, args: &mut Vec<Bytes>) {
        if let Some(pattern) = &self.pattern {
            args.push(arg("MATCH"));
            args.push(arg(pattern));
        }
        if let Some(count) = self.count {
            args.push(arg("COUNT"));
            args.push(int_arg(count));
        }
    }
}

impl Client {
    /// Deletes keys; returns how many existed.
    pub async fn del(&mut self, keys: &[&str]) -> Result<i64> {
        let frame = self.execute(Command::Del, str_args(keys)).await?;
        reply::to_integer(frame)
    }

    /// Counts how many of the given keys exist.
    pub async fn exists(&mut self, keys: &[&str]) -> Result<i64> {
        let frame = self.execute(Command::Exists, str_args(keys)).await?;
        reply::to_integer(frame)
    }

    /// Returns the value type stored at `key` (`string`, `list`, `none`...).
    pub async fn key_type(&mut self, key: &str) -> Result<String> {
        let frame = self.execute(Command::Type, vec![arg(key)]).await?;
        reply::to_status(frame)
    }

    /// Attaches a time to live in seconds. Returns true when the timeout was
    /// set, false when the key does not exist.
    pub async fn expire(&mut self, key: &str, seconds: i64) -> Result<bool> {
        let frame = self
            .execute(Command::Expire, vec![arg(key), int_arg(seconds)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn expire_at(&mut self, key: &str, unix_seconds: i64) -> Result<bool> {
        let frame = self
            .execute(Command::ExpireAt, vec![arg(key), int_arg(unix_seconds)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn pexpire(&mut self, key: &str, millis: i64) -> Result<bool> {
        let frame = self
            .execute(Command::PExpire, vec![arg(key), int_arg(millis)])
            .await?;
        reply::to_bool(frame)
    }

    /// Remaining time to live in seconds; -1 without expiry, -2 when the key
    /// is missing.
    pub async fn ttl(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::Ttl, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    pub async fn pttl(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::PTtl, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    /// Drops the expiry from `key`. Returns true when one was removed.
    pub async fn persist(&mut self, key: &str) -> Result<bool> {
        let frame = self.execute(Command::Persist, vec![arg(key)]).await?;
        reply::to_bool(frame)
    }

    /// All keys matching the glob pattern. Prefer [`scan`](Client::scan) on
    /// anything but tiny databases.
    pub async fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        let frame = self.execute(Command::Keys, vec![arg(pattern)]).await?;
        reply::to_strings(frame)
    }

    pub async fn rename(&mut self, old_key: &str, new_key: &str) -> Result<String> {
        let frame = self
            .execute(Command::Rename, vec![arg(old_key), arg(new_key)])
            .await?;
        reply::to_status(frame)
    }

    /// Renames only when `new_key` does not exist yet.
    pub async fn renamenx(&mut self, old_key: &str, new_key: &str) -> Result<bool> {
        let frame = self
            .execute(Command::RenameNx, vec![arg(old_key), arg(new_key)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn random_key(&mut self) -> Result<Option<String>> {
        let frame = self.execute(Command::RandomKey, Vec::new()).await?;
        reply::to_string(frame)
    }

    /// One page of an incremental key-space walk. Pass the returned cursor
    /// back in until [`ScanResult::is_finished`].
    pub async fn scan(&mut self, cursor: &str, params: &ScanParams) -> Result<ScanResult> {
        let mut args = vec![arg(cursor)];
        params.append_to(&mut args);
        let frame = self.execute(Command::Scan, args).await?;
        reply::to_scan(frame)
    }
}
