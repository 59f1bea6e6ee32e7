use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::{AuditRecord, AuditStore};

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Audit level controlling whether `position_start`/`position_end` are
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Basic,
    Detailed,
}

/// Invoked when the bounded channel is saturated and a batch is dropped.
/// Lets the caller wire a metrics counter without this crate depending on
/// one.
pub trait AuditDropHook: Send + Sync {
    fn on_dropped(&self, batch_size: usize);
}

pub struct NoopDropHook;
impl AuditDropHook for NoopDropHook {
    fn on_dropped(&self, _batch_size: usize) {}
}

/// Fire-and-forget sink: the orchestrator hands it a batch and moves on. A
/// single background task drains the channel and writes to the store;
/// overflow is drop-with-warning, never a blocked caller.
pub struct AuditSink {
    sender: mpsc::Sender<Vec<AuditRecord>>,
    drop_hook: Arc<dyn AuditDropHook>,
    worker: JoinHandle<()>,
}

impl AuditSink {
    pub fn spawn(store: Arc<dyn AuditStore>) -> Self {
        Self::spawn_with_capacity(store, DEFAULT_CHANNEL_CAPACITY, Arc::new(NoopDropHook))
    }

    pub fn spawn_with_capacity(store: Arc<dyn AuditStore>, capacity: usize, drop_hook: Arc<dyn AuditDropHook>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Vec<AuditRecord>>(capacity);
        let worker = tokio::spawn(async move {
            while let Some(batch) = receiver.recv().await {
                if let Err(error) = store.write_batch(&batch) {
                    tracing::warn!(%error, "audit store write failed, records dropped");
                }
            }
        });
        Self { sender, drop_hook, worker }
    }

    /// Fire-and-forget submission. Never blocks; on a saturated channel the
    /// batch is dropped with a warning and the drop hook is invoked.
    pub fn submit(&self, batch: Vec<AuditRecord>) {
        if batch.is_empty() {
            return;
        }
        let batch_len = batch.len();
        if let Err(error) = self.sender.try_send(batch) {
            tracing::warn!(batch_len, "audit channel saturated, dropping batch");
            self.drop_hook.on_dropped(batch_len);
            drop(error);
        }
    }

    /// Used by graceful shutdown to drain in-flight writes before exit.
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.worker.await;
    }
}
