//! Tracking of spawned request chains so they can be cancelled together.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::task::{AbortHandle, JoinHandle};

use crate::{OrchestratorError, ToolReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain-{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct InFlightRegistry {
    next_id: AtomicU64,
    closed: AtomicBool,
    chains: Mutex<HashMap<ChainId, AbortHandle>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_id(&self) -> ChainId {
        ChainId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Spawns `spawn()` while holding the table lock so a chain that finishes
    /// immediately cannot deregister before it was registered. Returns `None`
    /// without spawning once the registry is closed.
    pub(crate) fn track<F>(
        &self,
        id: ChainId,
        spawn: F,
    ) -> Option<JoinHandle<Result<ToolReply, OrchestratorError>>>
    where
        F: FnOnce() -> JoinHandle<Result<ToolReply, OrchestratorError>>,
    {
        match self.chains.lock() {
            Ok(mut chains) => {
                if self.is_closed() {
                    return None;
                }
                let join = spawn();
                chains.insert(id, join.abort_handle());
                Some(join)
            }
            Err(_) => {
                tracing::error!(chain = %id, "in-flight registry lock poisoned, chain is untracked");
                Some(spawn())
            }
        }
    }

    pub(crate) fn release(&self, id: ChainId) {
        if let Ok(mut chains) = self.chains.lock() {
            chains.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.chains.lock().map(|chains| chains.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the registry and aborts every tracked chain, returning how many
    /// were still running.
    pub fn cancel_all(&self) -> usize {
        let drained = match self.chains.lock() {
            Ok(mut chains) => {
                self.closed.store(true, Ordering::Release);
                chains.drain().collect::<Vec<_>>()
            }
            Err(_) => {
                self.closed.store(true, Ordering::Release);
                return 0;
            }
        };

        for (id, handle) in &drained {
            tracing::debug!(chain = %id, "cancelling request chain");
            handle.abort();
        }
        drained.len()
    }
}

/// Handle to a chain started with
/// [`RequestOrchestrator::submit`](crate::RequestOrchestrator::submit).
#[derive(Debug)]
pub struct ChainHandle {
    id: ChainId,
    join: JoinHandle<Result<ToolReply, OrchestratorError>>,
}

impl ChainHandle {
    pub(crate) fn new(id: ChainId, join: JoinHandle<Result<ToolReply, OrchestratorError>>) -> Self {
        Self { id, join }
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn cancel(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(self) -> Result<ToolReply, OrchestratorError> {
        match self.join.await {
            Ok(result) => result,
            Err(error) if error.is_cancelled() => Err(OrchestratorError::cancelled(format!(
                "{} was cancelled",
                self.id
            ))),
            Err(error) => {
                tracing::error!(chain = %self.id, error = %error, "request chain panicked");
                Err(OrchestratorError::configuration(format!(
                    "{} failed unexpectedly: {error}",
                    self.id
                )))
            }
        }
    }
}
