use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Run a side effect after the owning state change has committed.
///
/// The outcome never reaches the caller's response: failures are logged and
/// dropped. The handle is returned so tests can wait for completion.
pub fn spawn_best_effort<F>(effect: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => debug!(effect, "side effect done"),
            Err(e) => warn!(effect, error = %format!("{e:#}"), "side effect failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failures_are_swallowed() {
        let handle = spawn_best_effort("test", async { anyhow::bail!("smtp down") });
        assert!(handle.await.is_ok());
    }
}
