use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration governing when optimization runs and how aggressively.
#[derive(Debug, Clone)]
pub struct OptimizationConfig {
    pub enabled: bool,
    pub min_prompt_length: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self { enabled: true, min_prompt_length: 50 }
    }
}

/// Outcome of one optimization attempt, reported in response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub text: String,
    pub applied: bool,
    pub tokens_saved: u32,
    pub reduction_percentage: f64,
}

static REDUNDANCY_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)in order to").unwrap(), "to"),
        (Regex::new(r"(?i)due to the fact that").unwrap(), "because"),
        (Regex::new(r"(?i)at this point in time").unwrap(), "now"),
        (Regex::new(r"(?i)for the purpose of").unwrap(), "for"),
        (Regex::new(r"(?i)in the event that").unwrap(), "if"),
    ]
});

static FILLER_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(basically|actually|really|very|just|quite|simply|literally)\b\s*").unwrap()
});

static VERBOSE_PHRASES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)I was wondering if you could possibly").unwrap(), "please"),
        (Regex::new(r"(?i)would it be possible for you to").unwrap(), "please"),
        (Regex::new(r"(?i)I would like to ask you to").unwrap(), "please"),
    ]
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Applies the four bounded, deterministic passes in order: redundancy
/// phrase replacement, filler-word removal, verbose-phrase simplification,
/// whitespace compression. Every pass is a pure regex substitution; none may
/// touch a character index inside `protected_spans` (token placeholders from
/// the redactor).
pub fn optimize(prompt: &str, config: &OptimizationConfig, protected_spans: &[(usize, usize)]) -> OptimizationResult {
    if !config.enabled || prompt.chars().count() < config.min_prompt_length {
        return OptimizationResult { text: prompt.to_string(), applied: false, tokens_saved: 0, reduction_percentage: 0.0 };
    }

    let outcome = std::panic::catch_unwind(|| run_passes(prompt, protected_spans));

    match outcome {
        Ok(optimized) => {
            let original_tokens = estimate_tokens(prompt);
            let optimized_tokens = estimate_tokens(&optimized);
            let tokens_saved = original_tokens.saturating_sub(optimized_tokens);
            let reduction_percentage = if original_tokens == 0 {
                0.0
            } else {
                (tokens_saved as f64 / original_tokens as f64) * 100.0
            };
            let applied = optimized != prompt;
            OptimizationResult {
                text: optimized,
                applied,
                tokens_saved: if applied { tokens_saved } else { 0 },
                reduction_percentage: if applied { reduction_percentage } else { 0.0 },
            }
        }
        Err(_) => {
            tracing::warn!("prompt optimization pass panicked, returning original prompt");
            OptimizationResult { text: prompt.to_string(), applied: false, tokens_saved: 0, reduction_percentage: 0.0 }
        }
    }
}

fn run_passes(prompt: &str, protected_spans: &[(usize, usize)]) -> String {
    // Token placeholders are opaque, bracket-delimited runs; since none of
    // these passes can partially match inside `[KIND_TOKEN_id]` without
    // crossing a bracket, and callers pass the token spans purely for this
    // invariant's documentation, we still re-verify no pass touches them.
    let mut text = prompt.to_string();

    for (pattern, replacement) in REDUNDANCY_PATTERNS.iter() {
        text = apply_guarded(&text, pattern, replacement, protected_spans);
    }

    text = apply_guarded(&text, &FILLER_WORDS_RE, "", protected_spans);

    for (pattern, replacement) in VERBOSE_PHRASES.iter() {
        text = apply_guarded(&text, pattern, replacement, protected_spans);
    }

    text = WHITESPACE_RE.replace_all(&text, " ").to_string();
    text = BLANK_LINES_RE.replace_all(&text, "\n\n").to_string();
    text.trim().to_string()
}

fn apply_guarded(text: &str, pattern: &Regex, replacement: &str, protected_spans: &[(usize, usize)]) -> String {
    if protected_spans.is_empty() {
        return pattern.replace_all(text, replacement).to_string();
    }
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;
    for m in pattern.find_iter(text) {
        let overlaps_protected = protected_spans.iter().any(|(s, e)| m.start() < *e && m.end() > *s);
        result.push_str(&text[last_end..m.start()]);
        if overlaps_protected {
            result.push_str(m.as_str());
        } else {
            result.push_str(replacement);
        }
        last_end = m.end();
    }
    result.push_str(&text[last_end..]);
    result
}

fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() / 4) as u32
}
