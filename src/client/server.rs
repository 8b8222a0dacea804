//! Server, administrative and introspection commands.

use std::collections::HashMap;

use super::{arg, int_arg, Client};
use crate::commands::Command;
use crate::frame::Frame;
use crate::reply;
use crate::{Error, Result};

impl Client {
    /// Health check. Answers `PONG`, or echoes the payload when given one.
    pub async fn ping(&mut self) -> Result<String> {
        let frame = self.execute(Command::Ping, Vec::new()).await?;
        reply::to_status(frame)
    }

    pub async fn echo(&mut self, message: &str) -> Result<String> {
        let frame = self.execute(Command::Echo, vec![arg(message)]).await?;
        match reply::to_string(frame)? {
            Some(echoed) => Ok(echoed),
            None => Err(Error::Data("unexpected null echo reply".to_string())),
        }
    }

    /// Re-authenticates mid-session. The construction-time password is
    /// already sent automatically on connect.
    pub async fn auth(&mut self, password: &str) -> Result<String> {
        let frame = self.execute(Command::Auth, vec![arg(password)]).await?;
        reply::to_status(frame)
    }

    /// Switches the logical database for this connection.
    pub async fn select(&mut self, db: u32) -> Result<String> {
        let frame = self.execute(Command::Select, vec![int_arg(db as i64)]).await?;
        reply::to_status(frame)
    }

    /// Asks the server to close the connection, then releases the socket.
    pub async fn quit(&mut self) -> Result<String> {
        let frame = self.execute(Command::Quit, Vec::new()).await?;
        let status = reply::to_status(frame)?;
        self.close();
        Ok(status)
    }

    /// The INFO text, optionally narrowed to one section.
    pub async fn info(&mut self, section: Option<&str>) -> Result<String> {
        let args = match section {
            Some(section) => vec![arg(section)],
            None => Vec::new(),
        };
        let frame = self.execute(Command::Info, args).await?;
        match reply::to_string(frame)? {
            Some(info) => Ok(info),
            None => Err(Error::Data("unexpected null info reply".to_string())),
        }
    }

    pub async fn dbsize(&mut self) -> Result<i64> {
        let frame = self.execute(Command::DbSize, Vec::new()).await?;
        reply::to_integer(frame)
    }

    /// Deletes every key of the selected database.
    pub async fn flushdb(&mut self) -> Result<String> {
        let frame = self.execute(Command::FlushDb, Vec::new()).await?;
        reply::to_status(frame)
    }

    /// Deletes every key of every database.
    pub async fn flushall(&mut self) -> Result<String> {
        let frame = self.execute(Command::FlushAll, Vec::new()).await?;
        reply::to_status(frame)
    }

    /// CONFIG GET, folded into a parameter-to-value map.
    pub async fn config_get(&mut self, pattern: &str) -> Result<HashMap<String, String>> {
        let frame = self
            .execute(Command::Config, vec![arg("GET"), arg(pattern)])
            .await?;
        reply::to_string_map(frame)
    }

    pub async fn config_set(&mut self, parameter: &str, value: &str) -> Result<String> {
        let frame = self
            .execute(Command::Config, vec![arg("SET"), arg(parameter), arg(value)])
            .await?;
        reply::to_status(frame)
    }

    /// CLUSTER NODES as the raw text the server reports.
    pub async fn cluster_nodes(&mut self) -> Result<String> {
        let frame = self.execute(Command::Cluster, vec![arg("NODES")]).await?;
        match reply::to_string(frame)? {
            Some(nodes) => Ok(nodes),
            None => Err(Error::Data("unexpected null cluster reply".to_string())),
        }
    }

    /// CLUSTER SLOTS as the raw nested array; topology interpretation is the
    /// caller's business.
    pub async fn cluster_slots(&mut self) -> Result<Vec<Frame>> {
        let frame = self.execute(Command::Cluster, vec![arg("SLOTS")]).await?;
        reply::to_frames(frame)
    }
}
