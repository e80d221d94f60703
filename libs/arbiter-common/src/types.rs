use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Languages the grading engine can synthesize harnesses for.
///
/// Adding a language means adding a variant here, a runtime-registry entry,
/// and a program builder in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
}

impl Language {
    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "python" => Some(Language::Python),
            "javascript" => Some(Language::Javascript),
            _ => None,
        }
    }

    pub fn all() -> &'static [Language] {
        &[Language::Python, Language::Javascript]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Javascript => write!(f, "javascript"),
        }
    }
}

/// One user submission: source code plus target language.
/// Immutable for the duration of a grading run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub language: Language,
    pub source_code: String,
}

impl Submission {
    pub fn new(language: Language, source_code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            language,
            source_code: source_code.into(),
        }
    }
}

/// One test case: a JSON-representable input and the expected return value.
/// Supplied by the problem catalogue; read-only to the engine.
///
/// Object key order is preserved end-to-end (`serde_json/preserve_order`)
/// because the harness spreads mapping values positionally in key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected: Value,
}

/// Pass/fail outcome and diagnostic detail for one test case.
///
/// `input` / `expected` / `actual` are canonical JSON text, so a report is
/// reproducible independent of the target language. `error` is set for
/// compile/runtime/transport/synthesis failures, never for a plain mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub input: String,
    pub expected: String,
    pub actual: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// The terminal artifact of one grading run.
///
/// Holds exactly one verdict per test case, in input order, even when
/// individual cases failed for infrastructural reasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    pub submission_id: Uuid,
    pub score_percent: u8,
    pub passed_count: usize,
    pub total_count: usize,
    pub verdicts: Vec<Verdict>,
    pub total_elapsed_ms: u64,
    pub graded_at: DateTime<Utc>,
}

impl GradingReport {
    /// Linear partial credit: round(100 * passed / total).
    pub fn compute_score(passed_count: usize, total_count: usize) -> u8 {
        if total_count == 0 {
            return 0;
        }
        ((passed_count as f64 / total_count as f64) * 100.0).round() as u8
    }

    /// Whether every test case passed. Callers apply their own "mark problem
    /// solved" side effect off this, not the engine.
    pub fn solved(&self) -> bool {
        self.total_count > 0 && self.passed_count == self.total_count
    }
}
