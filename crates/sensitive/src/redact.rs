use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::SvContext;
use crate::detector::SvMatch;

/// Controls how token IDs are generated. Random mode draws from a 128-bit
/// value; sequential mode uses the context's monotonic counter, which makes
/// token order reproducible in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenGenerationMode {
    Random,
    Sequential,
}

impl Default for TokenGenerationMode {
    fn default() -> Self {
        TokenGenerationMode::Random
    }
}

/// Recognizes a token of either shape: `[KIND_TOKEN_<hex>]` (random mode) or
/// `[KIND_TOKEN_<digits>]` (sequential mode). A single regex accepts both.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[A-Z][A-Z_]*_TOKEN_[a-f0-9]+\]").unwrap());

/// Generates a fresh token for `kind` under the given generation mode,
/// advancing the context's counter when in sequential mode.
fn generate_token(kind_name: &str, mode: TokenGenerationMode, token_length: usize, context: &mut SvContext) -> String {
    match mode {
        TokenGenerationMode::Random => {
            let mut rng = rand::thread_rng();
            let raw: u128 = rng.r#gen();
            let hex = format!("{raw:032x}");
            let id = &hex[..token_length.min(hex.len())];
            format!("[{kind_name}_TOKEN_{id}]")
        }
        TokenGenerationMode::Sequential => {
            let id = context.next_counter();
            format!("[{kind_name}_TOKEN_{id:x}]")
        }
    }
}

/// Replaces each match with a deterministic-shape token and records the
/// reverse mapping in `context`. Matches are substituted in descending
/// `start` order so that earlier indices remain valid as later (earlier in
/// text) substitutions happen.
pub fn redact(text: &str, matches: &[SvMatch], context: &mut SvContext, mode: TokenGenerationMode, token_length: usize) -> String {
    let mut ordered: Vec<&SvMatch> = matches.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut output = text.to_string();
    for m in ordered {
        let token = generate_token(&m.kind.token_name(), mode, token_length, context);
        output.replace_range(m.start..m.end, &token);
        context.insert(token, m.value.clone(), m.kind.clone(), Some(m.start), Some(m.end));
    }
    output
}

/// Returns the byte spans of every token placeholder in `text`, for callers
/// (e.g. the prompt optimizer) that must not modify a token's characters.
pub fn token_spans(text: &str) -> Vec<(usize, usize)> {
    TOKEN_RE.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

/// Finds all tokens in `text` in descending `start` order and substitutes
/// each with its original value from `context`; unknown tokens (e.g.
/// fabricated by the model) are left verbatim. Idempotent: running on
/// already-restored text is a no-op.
pub fn restore(text: &str, context: &SvContext) -> String {
    let mut spans: Vec<(usize, usize, &str)> = TOKEN_RE
        .find_iter(text)
        .map(|m| (m.start(), m.end(), m.as_str()))
        .collect();
    spans.sort_by(|a, b| b.0.cmp(&a.0));

    let mut output = text.to_string();
    for (start, end, token) in spans {
        if let Some(original) = context.lookup(token) {
            output.replace_range(start..end, original);
        }
    }
    output
}
