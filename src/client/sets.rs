//! Set commands.
//!
//! Ref: <https://redis.io/docs/latest/commands/?group=set>

use bytes::Bytes;

use super::keys::ScanParams;
use super::{arg, int_arg, str_args, Client};
use crate::commands::Command;
use crate::reply::{self, ScanResult};
use crate::Result;

impl Client {
    /// Adds members; returns how many were not already present.
    pub async fn sadd(&mut self, key: &str, members: &[&str]) -> Result<i64> {
        let frame = self.execute(Command::SAdd, key_with(key, members)).await?;
        reply::to_integer(frame)
    }

    /// Removes members; returns how many were present.
    pub async fn srem(&mut self, key: &str, members: &[&str]) -> Result<i64> {
        let frame = self.execute(Command::SRem, key_with(key, members)).await?;
        reply::to_integer(frame)
    }

    /// Removes and returns one random member.
    pub async fn spop(&mut self, key: &str) -> Result<Option<String>> {
        let frame = self.execute(Command::SPop, vec![arg(key)]).await?;
        reply::to_string(frame)
    }

    pub async fn scard(&mut self, key: &str) -> Result<i64> {
        let frame = self.execute(Command::SCard, vec![arg(key)]).await?;
        reply::to_integer(frame)
    }

    pub async fn sismember(&mut self, key: &str, member: &str) -> Result<bool> {
        let frame = self
            .execute(Command::SIsMember, vec![arg(key), arg(member)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn smembers(&mut self, key: &str) -> Result<Vec<String>> {
        let frame = self.execute(Command::SMembers, vec![arg(key)]).await?;
        reply::to_strings(frame)
    }

    /// One random member without removing it, or several with `count`.
    pub async fn srandmember(&mut self, key: &str, count: Option<i64>) -> Result<Vec<String>> {
        let frame = match count {
            Some(count) => {
                self.execute(Command::SRandMember, vec![arg(key), int_arg(count)])
                    .await?
            }
            None => self.execute(Command::SRandMember, vec![arg(key)]).await?,
        };

        // Without a count the reply is a single (possibly absent) bulk.
        match count {
            Some(_) => reply::to_strings(frame),
            None => Ok(reply::to_string(frame)?.into_iter().collect()),
        }
    }

    /// Moves `member` between sets. Returns true when it was moved.
    pub async fn smove(&mut self, src_key: &str, dest_key: &str, member: &str) -> Result<bool> {
        let frame = self
            .execute(Command::SMove, vec![arg(src_key), arg(dest_key), arg(member)])
            .await?;
        reply::to_bool(frame)
    }

    pub async fn sinter(&mut self, keys: &[&str]) -> Result<Vec<String>> {
        let frame = self.execute(Command::SInter, str_args(keys)).await?;
        reply::to_strings(frame)
    }

    pub async fn sunion(&mut self, keys: &[&str]) -> Result<Vec<String>> {
        let frame = self.execute(Command::SUnion, str_args(keys)).await?;
        reply::to_strings(frame)
    }

    /// Members of the first set that appear in none of the others.
    pub async fn sdiff(&mut self, keys: &[&str]) -> Result<Vec<String>> {
        let frame = self.execute(Command::SDiff, str_args(keys)).await?;
        reply::to_strings(frame)
    }

    /// One page of an incremental walk over the set's members.
    pub async fn sscan(
        &mut self,
        key: &str,
        cursor: &str,
        params: &ScanParams,
    ) -> Result<ScanResult> {
        let mut args: Vec<Bytes> = vec![arg(key), arg(cursor)];
        params.append_to(&mut args);
        let frame = self.execute(Command::SScan, args).await?;
        reply::to_scan(frame)
    }
}

fn key_with(key: &str, members: &[&str]) -> Vec<Bytes> {
    let mut args = Vec::with_capacity(1 + members.len());
    args.push(arg(key));
    args.extend(members.iter().map(|m| arg(m)));
    args
}
