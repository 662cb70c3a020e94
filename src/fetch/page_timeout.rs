//! Timeout wrapper for browser operations
//!
//! Navigation and readiness waits can hang forever on long-polling pages;
//! every such await goes through [`with_page_timeout`].

use std::future::Future;
use std::time::Duration;

use super::FetchError;

/// Run `operation` with a hard deadline.
///
/// An elapsed deadline becomes [`FetchError::Timeout`] naming the operation
/// and URL; an operation error passes through unchanged.
pub async fn with_page_timeout<F, T>(
    operation: F,
    limit: Duration,
    operation_name: &str,
    url: &str,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            operation: operation_name.to_string(),
            secs: limit.as_secs(),
        }),
    }
}
