//! Lua scripting commands.
//!
//! EVAL can run arbitrarily long on the server, so it suspends the read
//! deadline the same way the blocking list pops do.

use bytes::Bytes;

use super::{arg, int_arg, Client};
use crate::commands::Command;
use crate::frame::Frame;
use crate::reply;
use crate::{Error, Result};

impl Client {
    /// Runs a script. The reply shape is script-defined, so the raw frame is
    /// returned for the caller to project.
    pub async fn eval(&mut self, script: &str, keys: &[&str], args: &[&str]) -> Result<Frame> {
        let params = script_params(arg(script), keys, args);
        self.execute_blocking(Command::Eval, params).await
    }

    /// Runs a script cached server-side by its SHA1 digest.
    pub async fn evalsha(&mut self, sha1: &str, keys: &[&str], args: &[&str]) -> Result<Frame> {
        let params = script_params(arg(sha1), keys, args);
        self.execute(Command::EvalSha, params).await
    }

    /// Loads a script into the server cache; returns its SHA1 digest.
    pub async fn script_load(&mut self, script: &str) -> Result<String> {
        let frame = self
            .execute(Command::Script, vec![arg("LOAD"), arg(script)])
            .await?;
        match reply::to_string(frame)? {
            Some(sha1) => Ok(sha1),
            None => Err(Error::Data("unexpected null script digest".to_string())),
        }
    }

    /// Which of the given digests are present in the server cache.
    pub async fn script_exists(&mut self, sha1s: &[&str]) -> Result<Vec<bool>> {
        let mut params = Vec::with_capacity(1 + sha1s.len());
        params.push(arg("EXISTS"));
        params.extend(sha1s.iter().map(|s| arg(s)));

        let frame = self.execute(Command::Script, params).await?;
        reply::to_bools(frame)
    }
}

fn script_params(body: Bytes, keys: &[&str], args: &[&str]) -> Vec<Bytes> {
    let mut params = Vec::with_capacity(2 + keys.len() + args.len());
    params.push(body);
    params.push(int_arg(keys.len() as i64));
    params.extend(keys.iter().map(|k| arg(k)));
    params.extend(args.iter().map(|a| arg(a)));
    params
}
