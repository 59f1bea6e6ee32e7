use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validators;

/// A tagged sensitive-value class. Built-in kinds are closed; `Custom` admits
/// operator-defined patterns registered at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum SvKind {
    Email,
    Phone,
    CreditCard,
    GovernmentIdUs,
    GovernmentIdIn,
    ApiKey,
    IpAddress,
    Custom(String),
}

impl SvKind {
    /// The uppercase name used in token shapes (`[KIND_TOKEN_id]`) and in
    /// `pii.detection.patterns.<KIND>` configuration keys.
    pub fn token_name(&self) -> String {
        match self {
            SvKind::Email => "EMAIL".to_string(),
            SvKind::Phone => "PHONE".to_string(),
            SvKind::CreditCard => "CREDIT_CARD".to_string(),
            SvKind::GovernmentIdUs => "GOVERNMENT_ID_US".to_string(),
            SvKind::GovernmentIdIn => "GOVERNMENT_ID_IN".to_string(),
            SvKind::ApiKey => "API_KEY".to_string(),
            SvKind::IpAddress => "IP_ADDRESS".to_string(),
            SvKind::Custom(name) => name.to_uppercase().replace(' ', "_"),
        }
    }

    /// Human-readable description surfaced on `GET /analytics/pii`.
    pub fn description(&self) -> String {
        match self {
            SvKind::Email => "Email address".to_string(),
            SvKind::Phone => "E.164 phone number".to_string(),
            SvKind::CreditCard => "Credit card number (Luhn-validated)".to_string(),
            SvKind::GovernmentIdUs => "US Social Security Number".to_string(),
            SvKind::GovernmentIdIn => "India Aadhaar number".to_string(),
            SvKind::ApiKey => "API key or bearer token".to_string(),
            SvKind::IpAddress => "IPv4 address".to_string(),
            SvKind::Custom(name) => format!("Custom pattern: {name}"),
        }
    }
}

/// One entry in the pattern registry: a compiled regex paired with the
/// validator that performs the semantic checks the regex can't.
pub struct PatternEntry {
    pub kind: SvKind,
    pub regex: Regex,
    pub region: Option<String>,
    pub enabled_by_default: bool,
    pub validator: fn(&str) -> bool,
}

/// A custom pattern supplied via `pii.detection.customPatterns[]`.
pub struct CustomPatternSpec {
    pub name: String,
    pub regex: String,
    pub region: Option<String>,
    pub enabled: bool,
}

/// Registration error: a malformed custom pattern fails at startup, never at
/// request time.
#[derive(Debug, thiserror::Error)]
pub enum PatternRegistrationError {
    #[error("invalid regex for custom pattern '{name}': {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9][a-z0-9._%+-]*@[a-z0-9.-]+\.[a-z]{2,}").unwrap()
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?[0-9][0-9\-. ()]{7,18}[0-9]").unwrap());

static CREDIT_CARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d[ -]?){13,19}\b").unwrap());

static GOVERNMENT_ID_US_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-?\d{2}-?\d{4}\b").unwrap());

static GOVERNMENT_ID_IN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\s?\d{4}\s?\d{4}\b").unwrap());

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:sk|pk|api)-[A-Za-z0-9_-]{16,}\b").unwrap()
});

static IP_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap());

/// Returns the seven built-in pattern entries, each compiled exactly once.
pub fn builtin_patterns() -> Vec<PatternEntry> {
    vec![
        PatternEntry {
            kind: SvKind::Email,
            regex: EMAIL_RE.clone(),
            region: None,
            enabled_by_default: true,
            validator: validators::email_validate,
        },
        PatternEntry {
            kind: SvKind::Phone,
            regex: PHONE_RE.clone(),
            region: Some("global".to_string()),
            enabled_by_default: true,
            validator: validators::e164_validate,
        },
        PatternEntry {
            kind: SvKind::CreditCard,
            regex: CREDIT_CARD_RE.clone(),
            region: None,
            enabled_by_default: true,
            validator: validators::luhn_check,
        },
        PatternEntry {
            kind: SvKind::GovernmentIdUs,
            regex: GOVERNMENT_ID_US_RE.clone(),
            region: Some("US".to_string()),
            enabled_by_default: true,
            validator: validators::government_id_us_validate,
        },
        PatternEntry {
            kind: SvKind::GovernmentIdIn,
            regex: GOVERNMENT_ID_IN_RE.clone(),
            region: Some("IN".to_string()),
            enabled_by_default: true,
            validator: validators::government_id_in_validate,
        },
        PatternEntry {
            kind: SvKind::ApiKey,
            regex: API_KEY_RE.clone(),
            region: None,
            enabled_by_default: true,
            validator: validators::api_key_validate,
        },
        PatternEntry {
            kind: SvKind::IpAddress,
            regex: IP_ADDRESS_RE.clone(),
            region: None,
            enabled_by_default: true,
            validator: validators::ipv4_validate,
        },
    ]
}

/// Compiles a custom pattern spec into a registry entry, or fails registration
/// (never request handling) if the regex doesn't parse.
pub fn compile_custom(spec: CustomPatternSpec) -> Result<PatternEntry, PatternRegistrationError> {
    let regex = Regex::new(&spec.regex).map_err(|source| PatternRegistrationError::InvalidRegex {
        name: spec.name.clone(),
        source,
    })?;
    Ok(PatternEntry {
        kind: SvKind::Custom(spec.name),
        regex,
        region: spec.region,
        enabled_by_default: spec.enabled,
        validator: validators::api_key_validate, // accept-all: custom patterns validate via regex alone
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_names_are_uppercase_with_underscores() {
        assert_eq!(SvKind::CreditCard.token_name(), "CREDIT_CARD");
        assert_eq!(SvKind::Custom("employee id".to_string()).token_name(), "EMPLOYEE_ID");
    }

    #[test]
    fn builtin_patterns_all_compile() {
        assert_eq!(builtin_patterns().len(), 7);
    }

    #[test]
    fn custom_pattern_rejects_invalid_regex_at_registration() {
        let spec = CustomPatternSpec {
            name: "broken".to_string(),
            regex: "(unclosed".to_string(),
            region: None,
            enabled: true,
        };
        assert!(compile_custom(spec).is_err());
    }
}
