use connectors::error::ConnectorError;
use engine_core::retry::{RetryDisposition, RetryError, RetryPolicy};
use std::future::Future;
use tracing::warn;

pub fn classify_connector_error(err: &ConnectorError) -> RetryDisposition {
    if err.is_transient() {
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}

/// Runs a connector call under `policy`, unwrapping the retry envelope.
pub async fn run_call<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    op: F,
) -> Result<T, ConnectorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConnectorError>>,
{
    policy
        .run(label, op, classify_connector_error)
        .await
        .map_err(|err| match err {
            RetryError::Fatal(e) => e,
            RetryError::AttemptsExceeded { error, attempts } => {
                warn!(call = label, attempts, error = %error, "Giving up after retries");
                error
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_status_5xx_is_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        let result: Result<(), _> = run_call(&policy, "insert", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ConnectorError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(ConnectorError::Status { status: 503, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        let result: Result<(), _> = run_call(&policy, "insert", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ConnectorError::Status {
                status: 409,
                body: "duplicate key".into(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_auth_is_fatal() {
        assert_eq!(
            classify_connector_error(&ConnectorError::Auth("denied".into())),
            RetryDisposition::Stop
        );
    }
}
