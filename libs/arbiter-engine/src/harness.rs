/// Harness Synthesizer - Program Construction for Untrusted Submissions
///
/// **Core Responsibility:**
/// Turn a user-written function body plus one structured test input into a
/// complete, runnable program whose only observable effect is printing the
/// canonical JSON serialization of the function's return value.
///
/// **Critical Properties:**
/// - Knows nothing about the sandbox or HTTP
/// - Knows nothing about scoring
/// - Pure transformation: (source, language, input) → program text
///
/// **Call-Shape Policy (identical across languages):**
/// - JSON object input → values spread positionally in key-insertion order
///   (never keyword arguments, even where the language supports them)
/// - JSON array input → elements spread positionally
/// - Any other value → passed as a single positional argument
///
/// **Why This Exists:**
/// Keeps language-specific templating behind one strategy seam so the rest of
/// the pipeline never branches on language.
use arbiter_common::types::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HarnessError {
    #[error("No function definition found in code")]
    EntryPointNotFound,
}

/// One program builder per language. Entry-point discovery is a lightweight
/// regex heuristic isolated behind this trait so a real parser can replace it
/// without touching callers.
pub trait ProgramBuilder: Send + Sync {
    /// Identifier of the first function declaration in the source, if any.
    fn entry_point(&self, source: &str) -> Option<String>;

    /// Complete program text invoking `entry_point` with the test input and
    /// printing the JSON-encoded result as the final stdout line.
    fn synthesize(&self, source: &str, entry_point: &str, input: &Value) -> String;
}

static PYTHON_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+(\w+)\s*\(").expect("invalid python def regex"));

static JAVASCRIPT_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\s+(\w+)\s*\(").expect("invalid javascript function regex"));

pub struct PythonBuilder;

impl ProgramBuilder for PythonBuilder {
    fn entry_point(&self, source: &str) -> Option<String> {
        PYTHON_DEF.captures(source).map(|c| c[1].to_string())
    }

    fn synthesize(&self, source: &str, entry_point: &str, input: &Value) -> String {
        let payload = escape_single_quoted(&input.to_string());
        format!(
            r#"{source}

# --- test harness ---
import json

_args = json.loads('{payload}')

if isinstance(_args, dict):
    _result = {entry_point}(*_args.values())
elif isinstance(_args, list):
    _result = {entry_point}(*_args)
else:
    _result = {entry_point}(_args)

print(json.dumps(_result))
"#
        )
    }
}

pub struct JavascriptBuilder;

impl ProgramBuilder for JavascriptBuilder {
    fn entry_point(&self, source: &str) -> Option<String> {
        JAVASCRIPT_FUNCTION.captures(source).map(|c| c[1].to_string())
    }

    fn synthesize(&self, source: &str, entry_point: &str, input: &Value) -> String {
        let payload = escape_single_quoted(&input.to_string());
        format!(
            r#"{source}

// --- test harness ---
const _args = JSON.parse('{payload}');

let _result;
if (Array.isArray(_args)) {{
  _result = {entry_point}(..._args);
}} else if (typeof _args === 'object' && _args !== null) {{
  _result = {entry_point}(...Object.values(_args));
}} else {{
  _result = {entry_point}(_args);
}}

console.log(JSON.stringify(_result));
"#
        )
    }
}

/// Select the builder for a language.
pub fn builder_for(language: Language) -> &'static dyn ProgramBuilder {
    match language {
        Language::Python => &PythonBuilder,
        Language::Javascript => &JavascriptBuilder,
    }
}

/// Synthesize the complete program for one test input.
///
/// Fails with [`HarnessError::EntryPointNotFound`] when the source contains no
/// recognizable function declaration; terminal for that test case only.
pub fn synthesize_program(
    language: Language,
    source: &str,
    input: &Value,
) -> Result<String, HarnessError> {
    let builder = builder_for(language);
    let entry_point = builder
        .entry_point(source)
        .ok_or(HarnessError::EntryPointNotFound)?;
    Ok(builder.synthesize(source, &entry_point, input))
}

/// Escape JSON text for embedding inside a single-quoted string literal.
/// The compact JSON form never contains raw control characters, so backslash
/// and single-quote are the only bytes that need care.
fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
