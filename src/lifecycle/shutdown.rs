//! Shutdown coordination.

use std::future::Future;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// A supervised task finished before shutdown was requested.
#[derive(Debug, Error)]
#[error("{0} exited without a shutdown signal")]
pub struct UnexpectedExit(pub &'static str);

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Subscribers that already exited are ignored.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Run until `signal` resolves, then trigger shutdown and wait for `task`
    /// to drain. Fails if `task` ends on its own first.
    pub async fn run_until<S>(
        &self,
        name: &'static str,
        mut task: JoinHandle<()>,
        signal: S,
    ) -> Result<(), UnexpectedExit>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            _ = &mut task => {
                tracing::error!(task = name, "Task exited without a shutdown signal");
                Err(UnexpectedExit(name))
            }
            _ = signal => {
                self.trigger();
                let _ = task.await;
                Ok(())
            }
        }
    }

    /// Number of subscribers still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
