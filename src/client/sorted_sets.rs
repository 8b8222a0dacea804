//! Sorted-set commands.
//!
//! Ref: <https://redis.io/docs/latest/commands/?group=sorted-set>

use bytes::Bytes;

use super::keys::ScanParams;
use super::{arg, float_arg, int_arg, Client};
use crate::commands::Command;
use crate::frame::Frame;
use crate::reply::{self, ScanResult, Tuple};
use crate::Result;

impl Client {
    /// Adds (or updates) one scored member; returns how many members were
    /// newly added.
    pub async fn zadd(&mut self, key: &str, score: f64, member: &str) -> Result<i64> {
        let frame = self
            .execute(Command::ZAdd, vec![arg(key), float_arg(score), arg(member)])
            .await?;
        reply::to_integer(frame)
    }

    /// Adds several scored members at once.
    pub async fn zadd_multiple(&mut self, key: &str, members: &[(f64, &str)]) -> Result<i64> {
        let mut args = Vec::with_capacity(1 + members.len() * 2);
        args.push(arg(key));
        for (score, member) in members {
            args.push(float_arg(*score));
            args.push(arg(member));
        }

        let frame = self.execute(Command::ZAdd, args).await?;
        reply::to_integer(frame)
    }

    /// Removes members; returns how many were present.
    pub async fn zrem(&mut self, key: &str, members: &[&str]) -> Result<i64> {
        let mut args = Vec::with_capacity(1 + members.len());
        args.push(arg(key));
        args.extend(members.iter().map(|m| arg(m)));

        let frame = self.execute(Command::ZRem, args).await?;
        reply::to_integer(frame)
    }

    /// The member's score, or `None` when absent.
    pub async fn zscore(&mut self, key: &str, member: &str) -> Result<Option<f64>> {
        let frame = self
            .execute(Command::ZScore, vec![arg(key), arg(member)])
            .await?;
        reply::to_float_opt(frame)
    }

    /// Increments the member's score; returns the new score.
    pub async fn zincr_by(&mut self, key: &str, increment: f64, member: &str) -> Result<f64> {
        let frame = self
            .execute(
                Command::ZIncrBy,
                vec![arg(key), float_arg(increment), arg(member)],
            )
            .await?;
        reply::to_float(frame)
    }

    pub async fn zcard(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::ZCard, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    /// How many members score between `min` and `max` inclusive.
    pub async fn zcount(&mut self, key: &str, min: f64, max: f64) -> Result<i64> {
        let frame = self
            .execute(Command::ZCount, vec![arg(key), float_arg(min), float_arg(max)])
            .await?;
        reply::to_integer(frame)
    }

    /// Zero-based rank in ascending score order, or `None` when absent.
    pub async fn zrank(&mut self, key: &str, member: &str) -> Result<Option<i64>> {
        let frame = self
            .execute(Command::ZRank, vec![arg(key), arg(member)])
            .await?;
        rank(frame)
    }

    /// Rank in descending score order.
    pub async fn zrevrank(&mut self, key: &str, member: &str) -> Result<Option<i64>> {
        let frame = self
            .execute(Command::ZRevRank, vec![arg(key), arg(member)])
            .await?;
        rank(frame)
    }

    /// Members between `start` and `stop` by ascending score.
    pub async fn zrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let frame = self
            .execute(Command::ZRange, vec![arg(key), int_arg(start), int_arg(stop)])
            .await?;
        reply::to_strings(frame)
    }

    pub async fn zrevrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let frame = self
            .execute(
                Command::ZRevRange,
                vec![arg(key), int_arg(start), int_arg(stop)],
            )
            .await?;
        reply::to_strings(frame)
    }

    /// ZRANGE WITHSCORES, paired into tuples.
    pub async fn zrange_with_scores(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Tuple>> {
        let frame = self
            .execute(
                Command::ZRange,
                vec![arg(key), int_arg(start), int_arg(stop), arg("WITHSCORES")],
            )
            .await?;
        reply::to_tuples(frame)
    }

    /// Members scoring between `min` and `max` inclusive, ascending.
    pub async fn zrange_by_score(&mut self, key: &str, min: f64, max: f64) -> Result<Vec<String>> {
        let frame = self
            .execute(
                Command::ZRangeByScore,
                vec![arg(key), float_arg(min), float_arg(max)],
            )
            .await?;
        reply::to_strings(frame)
    }

    /// One page of an incremental walk over the sorted set. Entries
    /// alternate member and score.
    pub async fn zscan(
        &mut self,
        key: &str,
        cursor: &str,
        params: &ScanParams,
    ) -> Result<ScanResult> {
        let mut args: Vec<Bytes> = vec![arg(key), arg(cursor)];
        params.append_to(&mut args);
        let frame = self.execute(Command::ZScan, args).await?;
        reply::to_scan(frame)
    }
}

// ZRANK answers an integer for present members and a null bulk otherwise,
// so the plain integer projection (null => 0) would lose the distinction.
fn rank(frame: Frame) -> Result<Option<i64>> {
    match frame {
        Frame::Null => Ok(None),
        other => reply::to_integer(other).map(Some),
    }
}
