//! Graceful shutdown coordinator
//!
//! Long-running tasks (the reclamation sweeper) subscribe and stop at
//! their next safe point when shutdown is initiated. In-flight lifecycle
//! operations are never cancelled mid-flight; the coordinator only stops
//! new ticks from starting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Shutdown progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Shutdown,
}

/// Broadcast-based shutdown coordinator
pub struct ShutdownCoordinator {
    state: Arc<RwLock<ShutdownState>>,
    shutdown_tx: broadcast::Sender<()>,
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a coordinator; `timeout` is how long subscribers get to wind down
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            state: Arc::new(RwLock::new(ShutdownState::Running)),
            shutdown_tx,
            timeout,
        }
    }

    /// Subscribe to the shutdown notification
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiate shutdown and wait out the wind-down timeout
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write().await;
            if *state != ShutdownState::Running {
                warn!("shutdown already in progress");
                return;
            }
            *state = ShutdownState::ShuttingDown;
        }

        info!("initiating graceful shutdown");
        // No receivers is fine: nothing is running that needs the signal.
        let _ = self.shutdown_tx.send(());

        tokio::time::sleep(self.timeout).await;

        *self.state.write().await = ShutdownState::Shutdown;
        info!("shutdown complete");
    }

    /// Whether shutdown has been initiated
    pub async fn is_shutting_down(&self) -> bool {
        *self.state.read().await != ShutdownState::Running
    }

    /// Current state
    pub async fn state(&self) -> ShutdownState {
        *self.state.read().await
    }
}
