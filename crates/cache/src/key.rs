use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

const HASH_CHARS: usize = 12;

/// Canonicalizes `(prompt, modelId, optional paramString)` into
/// `"<prefix>:<hash>"`, where `hash` is the first 12 characters of the
/// URL-safe, unpadded base64 of `SHA-256(prompt ∥ "|" ∥ modelId ∥ ["|" ∥
/// paramString])`. Collisions at 12 base64 chars (~72 bits) are acceptable:
/// the cache is never the source of truth and entries carry per-key TTLs.
pub fn cache_key(prefix: &str, prompt: &str, model_id: &str, param_string: Option<&str>) -> String {
    let mut material = format!("{prompt}|{model_id}");
    if let Some(params) = param_string {
        material.push('|');
        material.push_str(params);
    }

    let digest = Sha256::digest(material.as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest);
    let hash = &encoded[..HASH_CHARS.min(encoded.len())];
    format!("{prefix}:{hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_key() {
        let a = cache_key("llmg", "hello world", "gpt-4o-mini", None);
        let b = cache_key("llmg", "hello world", "gpt-4o-mini", None);
        assert_eq!(a, b);
    }

    #[test]
    fn different_model_changes_the_key() {
        let a = cache_key("llmg", "hello world", "gpt-4o-mini", None);
        let b = cache_key("llmg", "hello world", "gpt-4o", None);
        assert_ne!(a, b);
    }

    #[test]
    fn key_carries_the_configured_prefix() {
        let key = cache_key("myprefix", "p", "m", None);
        assert!(key.starts_with("myprefix:"));
    }

    #[test]
    fn param_string_participates_in_the_hash() {
        let a = cache_key("llmg", "hello", "gpt-4o-mini", Some("temp=0.2"));
        let b = cache_key("llmg", "hello", "gpt-4o-mini", Some("temp=0.9"));
        assert_ne!(a, b);
    }
}
