//! Closing the session at the end of a command
//!
//! Every command closes its session whatever the outcome. When both the
//! command and the close fail, the command's error is returned and the
//! close error is only logged.

use std::fmt::Display;

use anyhow::{Context, Result};
use playerctl_db::Session;
use tracing::error;

/// Close `session`, then combine the close result with the command's `outcome`.
pub async fn close_after<T, C>(session: &mut Session, outcome: Result<T>, context: C) -> Result<T>
where
    C: Display + Send + Sync + 'static,
{
    let closed = session.close().await.context(context);
    settle(outcome, closed)
}

/// The command's error wins over the close error.
fn settle<T>(outcome: Result<T>, closed: Result<()>) -> Result<T> {
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            error!(error = ?close_err, "Failed to close connection after error");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use playerctl_db::ConnectionConfig;

    #[test]
    fn command_error_wins_when_both_fail() {
        let err = settle::<()>(Err(anyhow!("query failed")), Err(anyhow!("close failed")))
            .unwrap_err();
        assert_eq!(err.to_string(), "query failed");
    }

    #[test]
    fn close_error_surfaces_after_success() {
        let err = settle(Ok(7), Err(anyhow!("close failed"))).unwrap_err();
        assert_eq!(err.to_string(), "close failed");
    }

    #[test]
    fn command_error_passes_through_clean_close() {
        let err = settle::<()>(Err(anyhow!("ping failed")), Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "ping failed");
    }

    #[test]
    fn value_returned_when_both_succeed() {
        assert_eq!(settle(Ok(7), Ok(())).unwrap(), 7);
    }

    #[tokio::test]
    async fn closed_session_keeps_command_error() {
        let mut session = Session::new(ConnectionConfig::default());
        let outcome: Result<()> = Err(anyhow!("stage 3/9 (destructive sync)"));
        let err = close_after(&mut session, outcome, "Failed to close connection")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "stage 3/9 (destructive sync)");
        assert!(!session.is_open());
    }
}
