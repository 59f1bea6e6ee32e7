//! Asynchronous audit persistence: a bounded worker pool drains per-request
//! detection batches into a durable store, and a scheduled sweep enforces
//! retention. Audit I/O never blocks or fails the user-facing response.

mod retention;
mod sink;
mod store;

pub use retention::spawn_retention_sweep;
pub use sink::{AuditDropHook, AuditLevel, AuditSink, NoopDropHook};
pub use store::{AuditRecord, AuditStore, AuditStoreError, InMemoryAuditStore, SqliteAuditStore};
