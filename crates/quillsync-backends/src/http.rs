//! Shared HTTP plumbing for the reqwest-based adapters

use std::time::Duration;

use reqwest::{Response, StatusCode};

use quillsync_core::status::{OpStatus, TaskError, TaskResult};

use crate::retry::{with_backoff, Attempt};

/// Sends a request, retrying throttle responses with backoff and
/// classifying transport failures. The builder closure is invoked
/// fresh for each attempt.
pub(crate) async fn send_with_retry<B>(operation: &str, build: B) -> TaskResult<Response>
where
    B: Fn() -> reqwest::RequestBuilder,
{
    with_backoff(operation, || async {
        match build().send().await {
            Err(err) => Attempt::Done(Err(map_transport_error(&err))),
            Ok(resp) => {
                let status = resp.status();
                if status == StatusCode::TOO_MANY_REQUESTS
                    || status == StatusCode::SERVICE_UNAVAILABLE
                {
                    Attempt::Throttled {
                        retry_after: parse_retry_after(&resp),
                        error: TaskError::other(format!("HTTP {status}")),
                    }
                } else {
                    Attempt::Done(Ok(resp))
                }
            }
        }
    })
    .await
}

/// Parses a `Retry-After` header (seconds form only)
fn parse_retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Maps a reqwest transport error onto the shared taxonomy
pub(crate) fn map_transport_error(err: &reqwest::Error) -> TaskError {
    let detail = format!("{err:?}").to_lowercase();
    let status = if detail.contains("dns") || detail.contains("resolve") {
        OpStatus::UnknownHost
    } else if err.is_connect() || err.is_timeout() {
        OpStatus::ConnectError
    } else {
        OpStatus::OtherError
    };
    TaskError::new(status, err.to_string())
}

/// Maps a non-success HTTP status onto the shared taxonomy
pub(crate) fn map_http_status(status: StatusCode, context: &str) -> TaskError {
    let op = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OpStatus::AuthError,
        StatusCode::NOT_FOUND => OpStatus::PathNotFound,
        _ => OpStatus::OtherError,
    };
    TaskError::new(op, format!("{context}: HTTP {status}"))
}
