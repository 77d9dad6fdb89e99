//! Bounded waits for remote calls

use std::future::Future;
use std::time::Duration;

use tracing::error;

use crate::error::{ChainError, Result};

/// Run a future, failing with [`ChainError::Timeout`] after `timeout_ms`
pub async fn with_timeout<T, F>(future: F, timeout_ms: u64) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(error = %e, "Operation failed");
            Err(e)
        }
        Err(_) => {
            error!(timeout_ms, "Operation timed out");
            Err(ChainError::Timeout { timeout_ms }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZetaMcpError;

    #[tokio::test]
    async fn test_completes_in_time() {
        let value = with_timeout(async { Ok(7) }, 1_000).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_times_out() {
        let err = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            10,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ZetaMcpError::Chain(ChainError::Timeout { timeout_ms: 10 })
        ));
    }
}
