use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::kinds::{builtin_patterns, PatternEntry, SvKind};

/// A single sensitive-value match. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvMatch {
    pub kind: SvKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

/// Result of a detection pass.
#[derive(Debug, Clone)]
pub struct DetectResult {
    pub matches: Vec<SvMatch>,
    pub elapsed: Duration,
}

/// Runs the enabled patterns over `text` and returns a non-overlapping,
/// position-sorted list of matches.
pub struct Detector {
    patterns: Vec<PatternEntry>,
}

impl Detector {
    pub fn new() -> Self {
        Self { patterns: builtin_patterns() }
    }

    pub fn with_patterns(patterns: Vec<PatternEntry>) -> Self {
        Self { patterns }
    }

    pub fn register(&mut self, entry: PatternEntry) {
        self.patterns.push(entry);
    }

    /// `enabled` selects which kinds (by token name) participate; `None` means
    /// "use each entry's own `enabled_by_default`".
    pub fn detect(&self, text: &str, enabled: Option<&HashSet<String>>) -> DetectResult {
        let start_time = Instant::now();
        if text.trim().is_empty() {
            return DetectResult { matches: Vec::new(), elapsed: start_time.elapsed() };
        }

        let mut candidates: Vec<SvMatch> = Vec::new();
        for entry in &self.patterns {
            let is_enabled = match enabled {
                Some(set) => set.contains(&entry.kind.token_name()),
                None => entry.enabled_by_default,
            };
            if !is_enabled {
                continue;
            }

            let hits = panic::catch_unwind(AssertUnwindSafe(|| {
                entry
                    .regex
                    .find_iter(text)
                    .filter(|m| (entry.validator)(m.as_str()))
                    .map(|m| SvMatch {
                        kind: entry.kind.clone(),
                        value: m.as_str().to_string(),
                        start: m.start(),
                        end: m.end(),
                    })
                    .collect::<Vec<_>>()
            }));

            match hits {
                Ok(matches) => candidates.extend(matches),
                Err(_) => {
                    tracing::warn!(kind = %entry.kind.token_name(), "detector pattern panicked, skipping kind for this request");
                }
            }
        }

        let matches = resolve_overlaps(candidates);
        DetectResult { matches, elapsed: start_time.elapsed() }
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort by `(start asc, length desc)`, then greedily accept a match iff its
/// start is at or after the end of the last accepted match. Ties on start
/// resolve to the longer span.
fn resolve_overlaps(mut candidates: Vec<SvMatch>) -> Vec<SvMatch> {
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
    });

    let mut accepted: Vec<SvMatch> = Vec::with_capacity(candidates.len());
    let mut last_end = 0usize;
    for candidate in candidates {
        if accepted.is_empty() || candidate.start >= last_end {
            last_end = candidate.end;
            accepted.push(candidate);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_matches() {
        let detector = Detector::new();
        let result = detector.detect("   ", None);
        assert!(result.matches.is_empty());
    }

    #[test]
    fn detects_email_and_ipv4_in_mixed_text() {
        let detector = Detector::new();
        let result = detector.detect("contact ada@example.com from 10.0.0.1 please", None);
        let kinds: HashSet<_> = result.matches.iter().map(|m| m.kind.clone()).collect();
        assert!(kinds.contains(&SvKind::Email));
        assert!(kinds.contains(&SvKind::IpAddress));
    }

    #[test]
    fn overlap_resolution_prefers_longer_span_on_tied_start() {
        let candidates = vec![
            SvMatch { kind: SvKind::Email, value: "a".to_string(), start: 0, end: 3 },
            SvMatch { kind: SvKind::Custom("x".to_string()), value: "ab".to_string(), start: 0, end: 5 },
        ];
        let resolved = resolve_overlaps(candidates);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].end, 5);
    }

    #[test]
    fn overlap_resolution_is_deterministic_across_runs() {
        let candidates = vec![
            SvMatch { kind: SvKind::Email, value: "a".to_string(), start: 5, end: 10 },
            SvMatch { kind: SvKind::Phone, value: "b".to_string(), start: 0, end: 6 },
            SvMatch { kind: SvKind::IpAddress, value: "c".to_string(), start: 12, end: 20 },
        ];
        let first = resolve_overlaps(candidates.clone());
        let second = resolve_overlaps(candidates);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn invalid_credit_card_luhn_is_rejected() {
        let detector = Detector::new();
        let result = detector.detect("card 4532015112830367 not valid", None);
        assert!(result.matches.iter().all(|m| m.kind != SvKind::CreditCard));
    }
}
