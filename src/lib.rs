pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod frame;
pub mod pipeline;
pub mod pool;
pub mod reply;
pub mod transaction;

pub use client::{Client, Message, ScanParams, SetCondition, SetExpiry, Subscription};
pub use config::Config;
pub use frame::Frame;
pub use pipeline::{Pending, Pipeline};
pub use pool::{Pool, PooledClient};
pub use reply::{ScanResult, Tuple};
pub use transaction::Transaction;

use thiserror::Error as ThisError;

/// Error taxonomy for the whole client.
///
/// Connection errors are sticky: the connection that produced one is marked
/// broken and every later read on it fails fast. Data errors indicate a reply
/// shape or API-usage problem and leave the connection usable.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Dial, read, write or deadline failure. The connection is broken.
    #[error("connection error: {0}")]
    Connection(String),

    /// Reply tag mismatch, server-reported error or illegal API usage.
    #[error("{0}")]
    Data(String),

    /// EXEC observed a watched key change; the server dropped the whole
    /// queued transaction. Callers may retry from WATCH.
    #[error("transaction aborted: a watched key changed before EXEC")]
    TransactionAborted,

    /// The pool is at capacity and holds no idle client.
    #[error("connection pool exhausted")]
    PoolExhausted,
}

impl Error {
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Connection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
