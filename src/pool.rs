//! A bounded pool of ready-to-use clients shared across concurrent callers.
//!
//! The pool is the only structure touched by more than one caller at a time;
//! its idle/total bookkeeping lives behind a mutex that is never held across
//! an await. A borrowed client is exclusively owned by its borrower until the
//! RAII guard returns it, and routing back is decided by the client's
//! health: only a connected, unbroken client in simple mode with no replies
//! owed rejoins the idle set; anything else is discarded.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::client::Client;
use crate::config::Config;
use crate::{Error, Result};

struct PoolState {
    idle: VecDeque<Client>,
    // Clients alive anywhere: idle plus borrowed.
    total: usize,
}

struct PoolInner {
    config: Config,
    max_size: usize,
    state: Mutex<PoolState>,
}

/// Cloneable pool handle.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    pub fn new(config: Config, max_size: usize) -> Pool {
        Pool {
            inner: Arc::new(PoolInner {
                config,
                max_size,
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    total: 0,
                }),
            }),
        }
    }

    /// Borrows a client: an idle one when available and still healthy,
    /// otherwise a freshly connected one, up to the configured maximum.
    ///
    /// Fails fast with [`Error::PoolExhausted`] at capacity.
    pub async fn get(&self) -> Result<PooledClient> {
        while let Some(client) = self.pop_idle() {
            if client.is_reusable() {
                return Ok(PooledClient {
                    pool: self.inner.clone(),
                    client: Some(client),
                });
            }
            // Stale idle client; discard it and keep looking.
            self.discard(client);
        }

        if !self.try_reserve() {
            return Err(Error::PoolExhausted);
        }

        let mut client = Client::new(self.inner.config.clone());
        match client.connect().await {
            Ok(()) => Ok(PooledClient {
                pool: self.inner.clone(),
                client: Some(client),
            }),
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    /// Clients alive right now, idle plus borrowed.
    pub fn size(&self) -> usize {
        let state = self.inner.state.lock().expect("pool mutex poisoned");
        state.total
    }

    /// Clients waiting in the idle set.
    pub fn idle(&self) -> usize {
        let state = self.inner.state.lock().expect("pool mutex poisoned");
        state.idle.len()
    }

    fn pop_idle(&self) -> Option<Client> {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        state.idle.pop_front()
    }

    fn try_reserve(&self) -> bool {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        if state.total >= self.inner.max_size {
            return false;
        }
        state.total += 1;
        true
    }

    fn release_slot(&self) {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        state.total = state.total.saturating_sub(1);
    }

    fn discard(&self, mut client: Client) {
        client.close();
        self.release_slot();
    }
}

/// RAII borrow of one pooled client.
///
/// Closing — explicitly or by drop — always goes through the pool: a
/// reusable client rejoins the idle set, any other is discarded and its
/// slot freed. The caller never picks the route.
pub struct PooledClient {
    pool: Arc<PoolInner>,
    client: Option<Client>,
}

impl PooledClient {
    /// Returns the client to its pool. Equivalent to dropping the guard;
    /// named for callers that want the return to read explicitly.
    pub fn close(self) {}
}

impl fmt::Debug for PooledClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledClient").finish_non_exhaustive()
    }
}

impl Deref for PooledClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        self.client.as_ref().expect("client present until drop")
    }
}

impl DerefMut for PooledClient {
    fn deref_mut(&mut self) -> &mut Client {
        self.client.as_mut().expect("client present until drop")
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        let mut client = match self.client.take() {
            Some(client) => client,
            None => return,
        };

        let mut state = self.pool.state.lock().expect("pool mutex poisoned");
        if client.is_reusable() {
            state.idle.push_back(client);
        } else {
            // Broken, disconnected, or left mid-transaction/pipeline: the
            // next borrower could never trust its reply pairing.
            debug!("discarding unusable pooled client");
            client.close();
            state.total = state.total.saturating_sub(1);
        }
    }
}
