use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection configuration, applied once at client construction.
///
/// `password` and `db` are issued as ordinary AUTH/SELECT commands right
/// after the socket connects, when non-default.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Bound on any individual reply read. Blocking commands such as BLPOP
    /// suspend this for their own duration.
    pub read_timeout: Duration,
    pub password: String,
    pub db: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            password: String::new(),
            db: 0,
        }
    }
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Config {
            host: host.into(),
            port,
            ..Config::default()
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn db(mut self, db: u32) -> Self {
        self.db = db;
        self
    }

    pub(crate) fn addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
