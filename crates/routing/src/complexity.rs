use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};

const REASONING_KEYWORDS: &[&str] = &[
    "why", "explain", "reason", "analyze", "because", "therefore", "prove", "deduce",
];
const MULTI_STEP_MARKERS: &[&str] = &[
    "first", "then", "next", "finally", "step", "afterwards", "subsequently",
];
const CREATIVE_VERBS: &[&str] = &[
    "write", "compose", "imagine", "design", "invent", "draft", "create",
];
const TECHNICAL_TERMS: &[&str] = &[
    "algorithm", "database", "api", "function", "architecture", "protocol", "kubernetes", "regex",
];
const CODE_MARKERS: &[&str] = &["```", "fn ", "def ", "class ", "import ", "SELECT "];

fn word_boundary_regex(words: &[&str]) -> Regex {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
    Regex::new(&pattern).unwrap()
}

static REASONING_RE: LazyLock<Regex> = LazyLock::new(|| word_boundary_regex(REASONING_KEYWORDS));
static MULTI_STEP_RE: LazyLock<Regex> = LazyLock::new(|| word_boundary_regex(MULTI_STEP_MARKERS));
static CREATIVE_RE: LazyLock<Regex> = LazyLock::new(|| word_boundary_regex(CREATIVE_VERBS));
static TECHNICAL_RE: LazyLock<Regex> = LazyLock::new(|| word_boundary_regex(TECHNICAL_TERMS));
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let escaped: Vec<String> = CODE_MARKERS.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&escaped.join("|")).unwrap()
});

/// `level` is a pure function of `score`, with thresholds at 30 and 60
/// (inclusive upper bound on the lower tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityLevel {
    Simple,
    Medium,
    Complex,
}

impl ComplexityLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=30 => ComplexityLevel::Simple,
            31..=60 => ComplexityLevel::Medium,
            _ => ComplexityLevel::Complex,
        }
    }
}

/// `score ∈ [0,100]`, `level` derived from `score`, plus a breakdown and
/// timing for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityScore {
    pub score: u32,
    pub level: ComplexityLevel,
    pub factor_scores: HashMap<String, u32>,
    pub reasoning: String,
    pub analysis_millis: u64,
}

/// Pure, repeatable scorer: the same input always produces the same score
/// within a build. No shared mutable state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, prompt: &str) -> ComplexityScore {
        let start = Instant::now();

        let length_score = length_factor(prompt);
        let reasoning_score = reasoning_factor(prompt);
        let technical_score = technical_factor(prompt);

        let total = (length_score + reasoning_score + technical_score).min(100);
        let level = ComplexityLevel::from_score(total);

        let mut factor_scores = HashMap::new();
        factor_scores.insert("length".to_string(), length_score);
        factor_scores.insert("reasoning".to_string(), reasoning_score);
        factor_scores.insert("technical".to_string(), technical_score);

        let reasoning_text = format!(
            "length={length_score} reasoning={reasoning_score} technical={technical_score} total={total}"
        );

        ComplexityScore {
            score: total,
            level,
            factor_scores,
            reasoning: reasoning_text,
            analysis_millis: start.elapsed().as_millis() as u64,
        }
    }
}

fn length_factor(prompt: &str) -> u32 {
    let estimated_tokens = prompt.chars().count() / 4;
    match estimated_tokens {
        0..=49 => 5,
        50..=99 => 10,
        100..=199 => 15,
        200..=399 => 20,
        _ => 30,
    }
}

fn reasoning_factor(prompt: &str) -> u32 {
    let reasoning_hits = REASONING_RE.find_iter(prompt).count() as u32;
    let multi_step_hits = MULTI_STEP_RE.find_iter(prompt).count() as u32;
    let creative_hits = CREATIVE_RE.find_iter(prompt).count() as u32;
    let question_marks = prompt.matches('?').count() as u32;

    let a = (reasoning_hits * 3).min(10);
    let b = (multi_step_hits * 4).min(10);
    let c = (creative_hits * 5).min(10);
    let d = if question_marks > 1 { (question_marks * 3).min(10) } else { 0 };

    (a + b + c + d).min(40)
}

fn technical_factor(prompt: &str) -> u32 {
    let technical_hits = TECHNICAL_RE.find_iter(prompt).count() as u32;
    let code_hits = CODE_RE.find_iter(prompt).count() as u32;

    let a = (technical_hits * 4).min(15);
    let b = (code_hits * 5).min(15);

    (a + b).min(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_plain_prompt_is_simple() {
        let analyzer = ComplexityAnalyzer::new();
        let result = analyzer.analyze("What is the capital of France?");
        assert!(matches!(result.level, ComplexityLevel::Simple | ComplexityLevel::Medium));
    }

    #[test]
    fn reasoning_heavy_prompt_scores_higher_than_plain() {
        let analyzer = ComplexityAnalyzer::new();
        let plain = analyzer.analyze("Tell me a fact.");
        let reasoning = analyzer.analyze(
            "Why does this algorithm work? Explain step by step, then analyze the architecture. First consider the database, then the API design.",
        );
        assert!(reasoning.score > plain.score);
    }

    #[test]
    fn analyzer_is_pure_and_repeatable() {
        let analyzer = ComplexityAnalyzer::new();
        let a = analyzer.analyze("Write a function to sort a list.");
        let b = analyzer.analyze("Write a function to sort a list.");
        assert_eq!(a.score, b.score);
        assert_eq!(a.level, b.level);
    }

    #[test]
    fn level_thresholds_match_spec_boundaries() {
        assert!(matches!(ComplexityLevel::from_score(30), ComplexityLevel::Simple));
        assert!(matches!(ComplexityLevel::from_score(31), ComplexityLevel::Medium));
        assert!(matches!(ComplexityLevel::from_score(60), ComplexityLevel::Medium));
        assert!(matches!(ComplexityLevel::from_score(61), ComplexityLevel::Complex));
    }

    #[test]
    fn score_never_exceeds_100() {
        let analyzer = ComplexityAnalyzer::new();
        let long_technical = "algorithm ".repeat(50) + &"why explain reason analyze ".repeat(20) + &"?".repeat(20);
        let result = analyzer.analyze(&long_technical);
        assert!(result.score <= 100);
    }
}
