//! Bounded backoff for rate-limited or momentarily unavailable backends
//!
//! Rate-limit responses (HTTP 429/503) are retried here, inside the
//! adapter layer, before any error surfaces to the task layer — the task
//! layer has no retry logic of its own. Backoff honors a server-directed
//! delay when one was given, otherwise doubles from one second per
//! attempt, and gives up after [`MAX_RETRIES`] retries.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use quillsync_core::status::{TaskError, TaskResult};

/// Maximum number of retries before the last error is surfaced
pub const MAX_RETRIES: u32 = 5;

/// Base delay for exponential backoff
const BASE_DELAY_SECS: u64 = 1;

/// One attempt's outcome, as classified by the adapter
pub enum Attempt<T> {
    /// Terminal: success or a non-retryable failure
    Done(TaskResult<T>),
    /// The backend asked us to slow down; retry after the server-directed
    /// delay when one was given
    Throttled {
        /// Parsed `Retry-After` (or equivalent), if the server sent one
        retry_after: Option<Duration>,
        /// The error to surface if retries run out
        error: TaskError,
    },
}

/// Runs `f` until it completes or the retry budget is spent
pub async fn with_backoff<T, F, Fut>(operation: &str, f: F) -> TaskResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_error: Option<TaskError> = None;

    for attempt in 0..=MAX_RETRIES {
        match f().await {
            Attempt::Done(result) => return result,
            Attempt::Throttled { retry_after, error } => {
                if attempt == MAX_RETRIES {
                    last_error = Some(error);
                    break;
                }
                let delay = retry_after
                    .unwrap_or_else(|| Duration::from_secs(BASE_DELAY_SECS << attempt));
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "backend throttled, backing off"
                );
                tokio::time::sleep(delay).await;
                last_error = Some(error);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| TaskError::other(format!("retry budget exhausted for {operation}"))))
}
