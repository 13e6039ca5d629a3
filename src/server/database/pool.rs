use anyhow::{bail, Context, Error};
use log::{error, info};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time;
use tokio_postgres::{Client, NoTls};

use crate::server::database::connection::PooledConnection;

/// Fixed-size FIFO connection pool. Items are handed out front-of-queue and
/// come back automatically when the [`PooledConnection`] drops.
pub(crate) struct Pool<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    /// pool name, for logs
    name: &'static str,
    /// idle items, accessed in a FIFO manner
    idle: Mutex<VecDeque<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Pool<T> {
        Pool {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Pool<T> {
    pub(crate) const DEFAULT_SIZE: usize = 10;
    const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// create an empty pool; fill it with [`Pool::init`] or [`Pool::release`]
    pub fn new(name: &'static str) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                idle: Mutex::new(VecDeque::with_capacity(Self::DEFAULT_SIZE)),
            }),
        }
    }

    /// acquire a connection with specified timeout, bail out if timeout exceeds.
    pub async fn acquire(&self, timeout_secs: u64) -> Option<PooledConnection<T>> {
        let deadline = time::Instant::now() + Duration::from_secs(timeout_secs);
        loop {
            if let Some(item) = self.pop() {
                return Some(PooledConnection::new(item, self.clone()));
            }
            if time::Instant::now() >= deadline {
                error!(
                    "timed out acquiring a connection from pool {} after {} seconds",
                    self.shared.name, timeout_secs
                );
                return None;
            }
            time::sleep(Self::ACQUIRE_POLL_INTERVAL).await;
        }
    }

    fn pop(&self) -> Option<T> {
        self.shared.idle.lock().ok()?.pop_front()
    }

    pub(crate) fn release(&self, item: T) {
        if let Ok(mut idle) = self.shared.idle.lock() {
            idle.push_back(item);
        }
    }
}

impl Pool<Client> {
    /// fill the pool with [`Pool::DEFAULT_SIZE`] connections, established
    /// concurrently; fails only when no connection at all could be made.
    pub async fn init(&self, conn_str: &str) -> Result<(), Error> {
        let mut set = JoinSet::new();
        for _ in 0..Self::DEFAULT_SIZE {
            let conn_str = conn_str.to_string();
            set.spawn(async move { connect(conn_str.as_str()).await });
        }
        let mut connected = 0_usize;
        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(client)) => {
                    connected += 1;
                    self.release(client);
                }
                Ok(Err(e)) => {
                    error!("pool {}: failed to establish connection, {}", self.shared.name, e);
                }
                Err(e) => {
                    error!("pool {}: join_next failed when joining, {}", self.shared.name, e);
                }
            }
        }
        if connected == 0 {
            bail!("pool {}: no connections could be established", self.shared.name);
        }
        info!("pool {} initialized with {} connections", self.shared.name, connected);
        Ok(())
    }
}

/// connect and hand the connection driver over to the runtime.
async fn connect(conn_str: &str) -> Result<Client, Error> {
    let (client, conn) = tokio_postgres::connect(conn_str, NoTls)
        .await
        .context("failed to create connection")?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            error!("connection returned error and aborted, {}", e);
        }
    });
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let pool: Pool<u8> = Pool::new("test");
        assert!(pool.acquire(0).await.is_none());

        pool.release(1);
        {
            let conn = match pool.acquire(0).await {
                Some(conn) => conn,
                None => panic!("should get some"),
            };
            assert_eq!(*conn, 1);
            assert!(pool.acquire(0).await.is_none());
        } // conn drops here, and is released automatically

        assert!(pool.acquire(0).await.is_some());
        assert!(pool.acquire(0).await.is_some());
    }

    #[tokio::test]
    async fn test_acquire_is_fifo() {
        let pool: Pool<u8> = Pool::new("test-fifo");
        pool.release(1);
        pool.release(2);

        let first = pool.acquire(0).await.map(|conn| *conn);
        assert_eq!(first, Some(1)); // released back here
        let second = pool.acquire(0).await.map(|conn| *conn);
        assert_eq!(second, Some(2));
    }
}
