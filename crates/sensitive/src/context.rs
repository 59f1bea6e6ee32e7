use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kinds::SvKind;

/// One append-only entry in a context's detection log. Contains no original
/// value: only length and position, so the audit trail never leaks the
/// sensitive value it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvDetectionRecord {
    pub kind: SvKind,
    pub token: String,
    pub original_length: usize,
    pub detected_at: DateTime<Utc>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

/// Per-request bidirectional map between tokens and the original values they
/// replaced, plus an ordered detection log. Created at request entry, owned
/// exclusively by that request, and destroyed at request exit.
#[derive(Debug, Clone)]
pub struct SvContext {
    pub request_id: Uuid,
    token_map: HashMap<String, String>,
    detections: Vec<SvDetectionRecord>,
    pub created_at: DateTime<Utc>,
    counter: u64,
}

impl SvContext {
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            token_map: HashMap::new(),
            detections: Vec::new(),
            created_at: Utc::now(),
            counter: 0,
        }
    }

    /// Reserves and returns the next sequential counter value, for sequential
    /// token-generation mode.
    pub fn next_counter(&mut self) -> u64 {
        let value = self.counter;
        self.counter += 1;
        value
    }

    /// Inserts a new `token → original` pair and its detection record.
    /// Panics (as a programmer error, not a request-time condition) if the
    /// token is already present, since tokens must be unique within a context.
    pub fn insert(&mut self, token: String, original: String, kind: SvKind, start: Option<usize>, end: Option<usize>) {
        debug_assert!(!self.token_map.contains_key(&token), "token collision within a single context");
        let original_length = original.chars().count();
        self.detections.push(SvDetectionRecord {
            kind,
            token: token.clone(),
            original_length,
            detected_at: Utc::now(),
            start,
            end,
        });
        self.token_map.insert(token, original);
    }

    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.token_map.get(token).map(String::as_str)
    }

    pub fn token_map(&self) -> &HashMap<String, String> {
        &self.token_map
    }

    pub fn detections(&self) -> &[SvDetectionRecord] {
        &self.detections
    }

    pub fn is_empty(&self) -> bool {
        self.token_map.is_empty()
    }

    /// Invariant check used by tests and by the orchestrator before handing a
    /// context to the audit sink: detections and token-map entries must be in
    /// 1:1 correspondence, and every token must be unique (guaranteed by the
    /// map itself).
    pub fn is_consistent(&self) -> bool {
        self.detections.len() == self.token_map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_detections_and_token_map_in_sync() {
        let mut ctx = SvContext::new(Uuid::new_v4());
        ctx.insert("[EMAIL_TOKEN_abc123]".to_string(), "a@b.com".to_string(), SvKind::Email, Some(0), Some(7));
        assert!(ctx.is_consistent());
        assert_eq!(ctx.lookup("[EMAIL_TOKEN_abc123]"), Some("a@b.com"));
        assert_eq!(ctx.detections()[0].original_length, 7);
    }

    #[test]
    fn counter_is_monotonic() {
        let mut ctx = SvContext::new(Uuid::new_v4());
        assert_eq!(ctx.next_counter(), 0);
        assert_eq!(ctx.next_counter(), 1);
        assert_eq!(ctx.next_counter(), 2);
    }
}
