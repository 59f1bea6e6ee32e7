use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted audit record. Logical schema; secondary indexes on `request_id`,
/// `kind`, and `created_at` are the store's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub request_id: Uuid,
    pub kind: String,
    pub token: String,
    pub original_length: usize,
    pub action: String,
    pub position_start: Option<usize>,
    pub position_end: Option<usize>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn redacted(request_id: Uuid, kind: String, token: String, original_length: usize, position: Option<(usize, usize)>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            kind,
            token,
            original_length,
            action: "REDACTED".to_string(),
            position_start: position.map(|(s, _)| s),
            position_end: position.map(|(_, e)| e),
            created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditStoreError {
    #[error("audit store I/O error: {0}")]
    Io(String),
}

/// Persistence contract for audit records. Implementations must not block
/// the orchestrator; writes arrive already batched per request.
pub trait AuditStore: Send + Sync {
    fn write_batch(&self, records: &[AuditRecord]) -> Result<(), AuditStoreError>;
    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError>;
    fn count(&self) -> Result<u64, AuditStoreError>;
    fn by_request_id(&self, request_id: Uuid) -> Result<Vec<AuditRecord>, AuditStoreError>;
}

/// In-process, `Vec`-backed store. Used in tests and as a fallback when no
/// durable backend is configured.
#[derive(Default)]
pub struct InMemoryAuditStore {
    records: std::sync::Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn write_batch(&self, records: &[AuditRecord]) -> Result<(), AuditStoreError> {
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }

    fn count(&self) -> Result<u64, AuditStoreError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }

    fn by_request_id(&self, request_id: Uuid) -> Result<Vec<AuditRecord>, AuditStoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.request_id == request_id)
            .cloned()
            .collect())
    }
}

/// SQLite-backed store: the shipped default, giving the retention sweep and
/// secondary-index queries concrete, testable behavior without a network
/// dependency.
pub struct SqliteAuditStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteAuditStore {
    pub fn open(path: &str) -> Result<Self, AuditStoreError> {
        let conn = rusqlite::Connection::open(path).map_err(|e| AuditStoreError::Io(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: std::sync::Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, AuditStoreError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(|e| AuditStoreError::Io(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: std::sync::Mutex::new(conn) })
    }

    fn init_schema(conn: &rusqlite::Connection) -> Result<(), AuditStoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_records (
                id TEXT PRIMARY KEY,
                request_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                token TEXT NOT NULL,
                original_length INTEGER NOT NULL,
                action TEXT NOT NULL,
                position_start INTEGER,
                position_end INTEGER,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_request_id ON audit_records(request_id);
            CREATE INDEX IF NOT EXISTS idx_audit_kind ON audit_records(kind);
            CREATE INDEX IF NOT EXISTS idx_audit_created_at ON audit_records(created_at);",
        )
        .map_err(|e| AuditStoreError::Io(e.to_string()))?;
        Ok(())
    }
}

impl AuditStore for SqliteAuditStore {
    fn write_batch(&self, records: &[AuditRecord]) -> Result<(), AuditStoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(|e| AuditStoreError::Io(e.to_string()))?;
        for record in records {
            tx.execute(
                "INSERT INTO audit_records (id, request_id, kind, token, original_length, action, position_start, position_end, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    record.id.to_string(),
                    record.request_id.to_string(),
                    record.kind,
                    record.token,
                    record.original_length as i64,
                    record.action,
                    record.position_start.map(|v| v as i64),
                    record.position_end.map(|v| v as i64),
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| AuditStoreError::Io(e.to_string()))?;
        }
        tx.commit().map_err(|e| AuditStoreError::Io(e.to_string()))?;
        Ok(())
    }

    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn
            .execute("DELETE FROM audit_records WHERE created_at < ?1", rusqlite::params![cutoff.to_rfc3339()])
            .map_err(|e| AuditStoreError::Io(e.to_string()))?;
        Ok(affected as u64)
    }

    fn count(&self) -> Result<u64, AuditStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM audit_records", [], |row| row.get::<_, i64>(0))
            .map(|v| v as u64)
            .map_err(|e| AuditStoreError::Io(e.to_string()))
    }

    fn by_request_id(&self, request_id: Uuid) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, request_id, kind, token, original_length, action, position_start, position_end, created_at FROM audit_records WHERE request_id = ?1")
            .map_err(|e| AuditStoreError::Io(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params![request_id.to_string()], |row| {
                let id: String = row.get(0)?;
                let req_id: String = row.get(1)?;
                let created_at: String = row.get(8)?;
                Ok(AuditRecord {
                    id: Uuid::parse_str(&id).unwrap_or_default(),
                    request_id: Uuid::parse_str(&req_id).unwrap_or_default(),
                    kind: row.get(2)?,
                    token: row.get(3)?,
                    original_length: row.get::<_, i64>(4)? as usize,
                    action: row.get(5)?,
                    position_start: row.get::<_, Option<i64>>(6)?.map(|v| v as usize),
                    position_end: row.get::<_, Option<i64>>(7)?.map(|v| v as usize),
                    created_at: DateTime::parse_from_rfc3339(&created_at).unwrap_or_default().with_timezone(&Utc),
                })
            })
            .map_err(|e| AuditStoreError::Io(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>().map_err(|e| AuditStoreError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn in_memory_store_writes_and_counts() {
        let store = InMemoryAuditStore::new();
        let record = AuditRecord::redacted(Uuid::new_v4(), "EMAIL".to_string(), "[EMAIL_TOKEN_1]".to_string(), 10, None, Utc::now());
        store.write_batch(&[record]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn sqlite_store_round_trips_a_batch() {
        let store = SqliteAuditStore::open_in_memory().unwrap();
        let request_id = Uuid::new_v4();
        let record = AuditRecord::redacted(request_id, "PHONE".to_string(), "[PHONE_TOKEN_1]".to_string(), 12, Some((3, 15)), Utc::now());
        store.write_batch(&[record]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let fetched = store.by_request_id(request_id).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].kind, "PHONE");
    }

    #[test]
    fn retention_sweep_deletes_records_older_than_cutoff() {
        let store = SqliteAuditStore::open_in_memory().unwrap();
        let old_record = AuditRecord::redacted(Uuid::new_v4(), "EMAIL".to_string(), "[EMAIL_TOKEN_1]".to_string(), 5, None, Utc::now() - ChronoDuration::days(40));
        let recent_record = AuditRecord::redacted(Uuid::new_v4(), "EMAIL".to_string(), "[EMAIL_TOKEN_2]".to_string(), 5, None, Utc::now());
        store.write_batch(&[old_record, recent_record]).unwrap();

        let deleted = store.delete_older_than(Utc::now() - ChronoDuration::days(30)).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count().unwrap(), 1);
    }
}
