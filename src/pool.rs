use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::debug;

use crate::db;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("timed out after {0:?} waiting for a database connection")]
    AcquireTimeout(Duration),
    #[error("connection pool is closed")]
    Closed,
    #[error("failed to open database connection: {0}")]
    Open(#[source] rusqlite::Error),
    #[error("database task failed: {0}")]
    Task(String),
}

struct PoolInner {
    db_path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl PoolInner {
    fn checkin(&self, conn: Connection) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        idle.push(conn);
    }
}

/// Bounded set of SQLite connections handed out one request at a time.
///
/// At most `max_connections` are borrowed concurrently; waiting for one is
/// capped by `acquire_timeout`. Connections are opened lazily and returned to
/// the idle list when the borrow is dropped.
#[derive(Clone)]
pub struct DbPool {
    inner: Arc<PoolInner>,
}

pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("connection is present until the borrow is dropped")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.checkin(conn);
        }
    }
}

impl DbPool {
    pub fn new(db_path: &Path, max_connections: usize, acquire_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                db_path: db_path.to_path_buf(),
                idle: Mutex::new(Vec::new()),
                permits: Arc::new(Semaphore::new(max_connections.max(1))),
                acquire_timeout,
            }),
        }
    }

    #[cfg(test)]
    pub fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub async fn acquire(&self) -> Result<PooledConnection, PoolError> {
        let wait = self.inner.acquire_timeout;
        let permit = timeout(wait, Arc::clone(&self.inner.permits).acquire_owned())
            .await
            .map_err(|_| PoolError::AcquireTimeout(wait))?
            .map_err(|_| PoolError::Closed)?;

        let reused = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        let conn = match reused {
            Some(conn) => conn,
            None => {
                debug!(path = %self.inner.db_path.display(), "opening pooled connection");
                let path = self.inner.db_path.clone();
                tokio::task::spawn_blocking(move || db::open_connection(&path))
                    .await
                    .map_err(|e| PoolError::Task(e.to_string()))?
                    .map_err(PoolError::Open)?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Borrows a connection, runs `f` on the blocking pool, and releases the
    /// connection whether `f` succeeds, fails, or panics.
    pub async fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<PoolError> + Send + 'static,
    {
        let conn = self.acquire().await?;
        tokio::task::spawn_blocking(move || f(&*conn))
            .await
            .map_err(|e| E::from(PoolError::Task(e.to_string())))?
    }
}
