//! Sensitive-value (SV) detection and reversible tokenization.
//!
//! A [`Detector`] finds [`SvMatch`]es in a prompt; [`redact::redact`] replaces
//! each match with a deterministic-shape token and records the reverse
//! mapping in an [`SvContext`]; [`redact::restore`] substitutes tokens back
//! into provider output before it reaches the caller. No original sensitive
//! value is ever logged, cached, or sent to the provider.

mod context;
mod detector;
mod kinds;
mod redact;
mod validators;

pub use context::{SvContext, SvDetectionRecord};
pub use detector::{DetectResult, Detector, SvMatch};
pub use kinds::{
    builtin_patterns, compile_custom, CustomPatternSpec, PatternEntry, PatternRegistrationError,
    SvKind,
};
pub use redact::{redact, restore, token_spans, TokenGenerationMode};
