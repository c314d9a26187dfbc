//! Cross-process exclusion for migration runs.
//!
//! On PostgreSQL a session-level advisory lock is taken on a connection
//! detached from the pool. Closing that connection releases the lock, so the
//! lock cannot leak back into the pool on any exit path. SQLite serializes
//! writers itself and gets no lock.

use std::time::{Duration, Instant};

use sqlx::{AnyConnection, AnyPool, Connection};

use crate::domain::errors::{MigrationError, MigrationResult};

/// Advisory lock key shared by every migrator process ("schemamg").
pub const MIGRATION_LOCK_KEY: i64 = 0x7363_6865_6d61_6d67;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const POSTGRES_BACKEND: &str = "PostgreSQL";

/// Run lock held for the duration of a migration run.
pub struct MigrationLock {
    conn: Option<AnyConnection>,
}

impl MigrationLock {
    /// A lock that holds nothing.
    pub const fn none() -> Self {
        Self { conn: None }
    }

    /// Take the run lock, waiting at most `timeout` for a concurrent run.
    pub async fn acquire(pool: &AnyPool, timeout: Duration) -> MigrationResult<Self> {
        let pooled = pool.acquire().await.map_err(MigrationError::Lock)?;
        if pooled.backend_name() != POSTGRES_BACKEND {
            return Ok(Self::none());
        }

        let mut conn = pooled.detach();
        let started = Instant::now();
        loop {
            let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
                .bind(MIGRATION_LOCK_KEY)
                .fetch_one(&mut conn)
                .await
                .map_err(MigrationError::Lock)?;

            if acquired {
                tracing::debug!(key = MIGRATION_LOCK_KEY, "migration lock acquired");
                return Ok(Self { conn: Some(conn) });
            }

            if started.elapsed() >= timeout {
                if let Err(e) = conn.close().await {
                    tracing::warn!(error = %e, "failed to close migration lock connection");
                }
                return Err(MigrationError::LockTimeout {
                    waited_secs: timeout.as_secs(),
                });
            }

            tracing::debug!("another migration run holds the lock, waiting");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Whether a PostgreSQL advisory lock is held.
    pub const fn is_held(&self) -> bool {
        self.conn.is_some()
    }

    /// Unlock and close the lock connection. Failures are logged, not returned.
    pub async fn release(mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if let Err(e) = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .fetch_one(&mut conn)
            .await
        {
            tracing::warn!(error = %e, "failed to release migration lock, closing its connection");
        }

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close migration lock connection");
        }
    }
}
