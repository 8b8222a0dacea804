//! Hash commands.
//!
//! Ref: <https://redis.io/docs/latest/commands/?group=hash>

use std::collections::HashMap;

use bytes::Bytes;

use super::keys::ScanParams;
use super::{arg, float_arg, int_arg, Client};
use crate::commands::Command;
use crate::reply::{self, ScanResult};
use crate::Result;

impl Client {
    /// Sets `field` in the hash at `key`. Returns true when the field is new.
    pub async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<bool> {
        let frame = self
            .execute(Command::HSet, vec![arg(key), arg(field), arg(value)])
            .await?;
        reply::to_bool(frame)
    }

    /// Sets `field` only when it does not exist yet.
    pub async fn hsetnx(&mut self, key: &str, field: &str, value: &str) -> Result<bool> {
        let frame = self
            .execute(Command::HSetNx, vec![arg(key), arg(field), arg(value)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>> {
        let frame = self
            .execute(Command::HGet, vec![arg(key), arg(field)])
            .await?;
        reply::to_string(frame)
    }

    /// Sets several fields at once.
    pub async fn hmset(&mut self, key: &str, fields: &[(&str, &str)]) -> Result<String> {
        let mut args = Vec::with_capacity(1 + fields.len() * 2);
        args.push(arg(key));
        for (field, value) in fields {
            args.push(arg(field));
            args.push(arg(value));
        }

        let frame = self.execute(Command::HMSet, args).await?;
        reply::to_status(frame)
    }

    /// Fetches several fields; missing fields yield `None` in place.
    pub async fn hmget(&mut self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        let mut args = Vec::with_capacity(1 + fields.len());
        args.push(arg(key));
        args.extend(fields.iter().map(|f| arg(f)));

        let frame = self.execute(Command::HMGet, args).await?;
        reply::to_optional_strings(frame)
    }

    /// Deletes fields; returns how many existed.
    pub async fn hdel(&mut self, key: &str, fields: &[&str]) -> Result<i64> {
        let mut args = Vec::with_capacity(1 + fields.len());
        args.push(arg(key));
        args.extend(fields.iter().map(|f| arg(f)));

        let frame = self.execute(Command::HDel, args).await?;
        reply::to_integer(frame)
    }

    pub async fn hlen(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::HLen, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    pub async fn hexists(&mut self, key: &str, field: &str) -> Result<bool> {
        let frame = self
            .execute(Command::HExists, vec![arg(key), arg(field)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn hincr_by(&mut self, key: &str, field: &str, increment: i64) -> Result<i64> {
        let frame = self
            .execute(
                Command::HIncrBy,
                vec![arg(key), arg(field), int_arg(increment)],
            )
            .await?;
        reply::to_integer(frame)
    }

    pub async fn hincr_by_float(&mut self, key: &str, field: &str, increment: f64) -> Result<f64> {
        let frame = self
            .execute(
                Command::HIncrByFloat,
                vec![arg(key), arg(field), float_arg(increment)],
            )
            .await?;
        reply::to_float(frame)
    }

    pub async fn hkeys(&mut self, key: &str) -> Result<Vec<String>> {
        let frame = self.execute(Command::HKeys, vec![arg(key)]).await?;
        reply::to_strings(frame)
    }

    pub async fn hvals(&mut self, key: &str) -> Result<Vec<String>> {
        let frame = self.execute(Command::HVals, vec![arg(key)]).await?;
        reply::to_strings(frame)
    }

    /// The whole hash as a field-to-value map.
    pub async fn hgetall(&mut self, key: &str) -> Result<HashMap<String, String>> {
        let frame = self.execute(Command::HGetAll, vec![arg(key)]).await?;
        reply::to_string_map(frame)
    }

    /// One page of an incremental walk over the hash's fields. Entries
    /// alternate field and value.
    pub async fn hscan(
        &mut self,
        key: &str,
        cursor: &str,
        params: &ScanParams,
    ) -> Result<ScanResult> {
        let mut args: Vec<Bytes> = vec![arg(key), arg(cursor)];
        params.append_to(&mut args);
        let frame = self.execute(Command::HScan, args).await?;
        reply::to_scan(frame)
    }
}
