//! services/api/src/adapters/retry.rs
//!
//! A small retry wrapper used around every database query. Attempts are
//! bounded by a timeout, and only failures that look transient (pool
//! exhaustion, dropped connections, timeouts) are retried. Writes that must
//! not apply twice go through `run_write`, which only retries when the
//! statement never left the pool.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Multiplied by the attempt number before each retry.
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Either the query failed or it ran out of time.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
    #[error("Query failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<QueryError>,
    },
}

impl QueryError {
    /// The underlying sqlx error, if there is one.
    pub fn as_sqlx(&self) -> Option<&sqlx::Error> {
        match self {
            QueryError::Sqlx(e) => Some(e),
            QueryError::Timeout(_) => None,
            QueryError::Exhausted { source, .. } => source.as_sqlx(),
        }
    }
}

pub fn is_transient(err: &QueryError) -> bool {
    match err {
        QueryError::Timeout(_) => true,
        QueryError::Exhausted { .. } => false,
        QueryError::Sqlx(e) => match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
            sqlx::Error::Database(_) | sqlx::Error::RowNotFound => false,
            other => is_transient_message(&other.to_string()),
        },
    }
}

/// True when the failure happened before a connection was handed out, so
/// the statement cannot have run.
pub fn never_sent(err: &QueryError) -> bool {
    matches!(err, QueryError::Sqlx(sqlx::Error::PoolTimedOut))
}

fn is_transient_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["timeout", "timed out", "connection", "econnrefused", "etimedout", "enotfound"]
        .iter()
        .any(|needle| message.contains(needle))
}

impl RetryPolicy {
    /// Runs `query` until it succeeds, fails permanently, or the retries are used up.
    pub async fn run<T, F, Fut>(&self, query: F) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        self.run_while(query, is_transient).await
    }

    /// Like `run`, for inserts and increments. A timeout or dropped connection
    /// may hide a committed write, so those are returned instead of retried.
    pub async fn run_write<T, F, Fut>(&self, query: F) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        self.run_while(query, never_sent).await
    }

    async fn run_while<T, F, Fut>(
        &self,
        mut query: F,
        retryable: fn(&QueryError) -> bool,
    ) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let attempts = self.retries + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match tokio::time::timeout(self.timeout, query()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => QueryError::Sqlx(e),
                Err(_) => QueryError::Timeout(self.timeout),
            };

            if !retryable(&result) {
                return Err(result);
            }
            if attempt >= attempts {
                return Err(QueryError::Exhausted {
                    attempts,
                    source: Box::new(result),
                });
            }

            warn!(
                "Query failed (attempt {}/{}), retrying: {}",
                attempt, attempts, result
            );
            tokio::time::sleep(self.base_delay * attempt).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            retries: 3,
            base_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(sqlx::Error::PoolTimedOut)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(sqlx::Error::RowNotFound) }
            })
            .await;
        assert!(matches!(result, Err(QueryError::Sqlx(sqlx::Error::RowNotFound))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_all_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(sqlx::Error::PoolClosed) }
            })
            .await;
        assert!(matches!(result, Err(QueryError::Exhausted { attempts: 4, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn writes_are_not_repeated_after_a_timeout() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run_write(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;
        assert!(matches!(result, Err(QueryError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn writes_retry_when_no_connection_was_available() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run_write(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(sqlx::Error::PoolTimedOut)
                    } else if n == 1 {
                        Ok(n)
                    } else {
                        Err(sqlx::Error::PoolClosed)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);

        calls.store(0, Ordering::SeqCst);
        let result: Result<(), _> = fast()
            .run_write(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))) }
            })
            .await;
        assert!(matches!(result, Err(QueryError::Sqlx(sqlx::Error::Io(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn classifies_by_message() {
        assert!(is_transient_message("Connection reset by peer"));
        assert!(!is_transient_message("syntax error at or near SELECT"));
    }
}
