/// Verdict Evaluator - Language-Agnostic Comparison Logic
///
/// **Core Responsibility:**
/// Turn one execution outcome plus the test case's expected value into a
/// pass/fail verdict with human-readable detail.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or the sandbox wire format
/// - Knows nothing about language runtimes
/// - Pure function: (outcome, test case) → verdict
///
/// **Comparison Rules:**
/// - Actual value is the last stdout line that parses as JSON (the harness
///   prints the result last; user prints before it are tolerated)
/// - Output that never parses is compared as a raw string, not treated as an
///   engine error
/// - Equality is canonical-JSON text equality: exact structural match, array
///   order significant, object key order as supplied, no numeric tolerance
/// - A mismatch is not an error; `error` is reserved for
///   synthesis/compile/runtime/transport failures
use arbiter_common::types::{TestCase, Verdict};
use serde_json::Value;
use tracing::debug;

use crate::sandbox::ExecutionOutcome;

/// Shown when a failure carries no usable detail.
const EXECUTION_FAILED: &str = "Execution failed";

/// Canonical JSON text of a value: compact form, object key order preserved
/// as supplied. Integers and floats keep their own representations, so `5`
/// and `5.0` intentionally compare unequal.
pub fn canonical(value: &Value) -> String {
    value.to_string()
}

/// Evaluate one execution outcome against a test case.
pub fn evaluate_case(outcome: ExecutionOutcome, case: &TestCase) -> Verdict {
    let input = canonical(&case.input);
    let expected = canonical(&case.expected);

    match outcome {
        ExecutionOutcome::Success { stdout, elapsed_ms } => {
            let actual = parse_actual(&stdout);
            let actual_text = canonical(&actual);
            Verdict {
                passed: actual_text == expected,
                input,
                expected,
                actual: actual_text,
                error: None,
                elapsed_ms: Some(elapsed_ms),
            }
        }
        ExecutionOutcome::CompileFailure { detail } => failure(input, expected, detail),
        ExecutionOutcome::RuntimeFailure {
            detail,
            partial_stdout,
        } => {
            if !partial_stdout.trim().is_empty() {
                debug!(partial_stdout = %partial_stdout.trim_end(), "output captured before failure");
            }
            failure(input, expected, detail)
        }
        ExecutionOutcome::TransportFailure { detail } => failure(input, expected, detail),
    }
}

/// Failed verdict for a test case whose harness could not be synthesized.
/// No sandbox call was made, so there is no outcome to classify.
pub fn failed_case(case: &TestCase, detail: &str) -> Verdict {
    failure(
        canonical(&case.input),
        canonical(&case.expected),
        detail.to_string(),
    )
}

fn failure(input: String, expected: String, detail: String) -> Verdict {
    let detail = if detail.trim().is_empty() {
        EXECUTION_FAILED.to_string()
    } else {
        detail
    };
    Verdict {
        passed: false,
        input,
        expected,
        actual: detail.clone(),
        error: Some(detail),
        elapsed_ms: None,
    }
}

/// Extract the result value from captured stdout.
///
/// Scans lines from the end for the first one that parses as JSON; falls back
/// to the whole trimmed output as a string value when nothing parses.
fn parse_actual(stdout: &str) -> Value {
    for line in stdout.lines().rev() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(line) {
            return value;
        }
    }
    Value::String(stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_sum_case() -> TestCase {
        TestCase {
            input: json!({"nums": [2, 7, 11, 15], "target": 9}),
            expected: json!([0, 1]),
        }
    }

    fn success(stdout: &str) -> ExecutionOutcome {
        ExecutionOutcome::Success {
            stdout: stdout.to_string(),
            elapsed_ms: 42,
        }
    }

    #[test]
    fn test_exact_match_passes() {
        let verdict = evaluate_case(success("[0, 1]"), &two_sum_case());

        assert!(verdict.passed);
        assert_eq!(verdict.input, r#"{"nums":[2,7,11,15],"target":9}"#);
        assert_eq!(verdict.expected, "[0,1]");
        assert_eq!(verdict.actual, "[0,1]");
        assert_eq!(verdict.error, None);
        assert_eq!(verdict.elapsed_ms, Some(42));
    }

    #[test]
    fn test_array_order_matters() {
        let verdict = evaluate_case(success("[1, 0]"), &two_sum_case());

        assert!(!verdict.passed);
        assert_eq!(verdict.actual, "[1,0]");
        // Wrong answer, not an error
        assert_eq!(verdict.error, None);
    }

    #[test]
    fn test_user_prints_before_result_are_tolerated() {
        let verdict = evaluate_case(success("debug: starting\nloop done\n[0, 1]"), &two_sum_case());
        assert!(verdict.passed);
    }

    #[test]
    fn test_malformed_output_compared_as_raw_string() {
        let case = TestCase {
            input: json!(5),
            expected: json!("<map object at 0x7f>"),
        };
        let verdict = evaluate_case(success("<map object at 0x7f>"), &case);

        assert!(verdict.passed);
        assert_eq!(verdict.actual, r#""<map object at 0x7f>""#);
    }

    #[test]
    fn test_malformed_output_against_structured_expected_fails() {
        let verdict = evaluate_case(success("not json at all"), &two_sum_case());
        assert!(!verdict.passed);
        assert_eq!(verdict.error, None);
    }

    #[test]
    fn test_string_results_require_json_quoting() {
        let case = TestCase {
            input: json!("abc"),
            expected: json!("cba"),
        };
        // The harness JSON-encodes the return value, so a string result
        // arrives quoted.
        let verdict = evaluate_case(success("\"cba\""), &case);
        assert!(verdict.passed);
    }

    #[test]
    fn test_object_key_order_is_significant() {
        let case = TestCase {
            input: json!(null),
            expected: json!({"a": 1, "b": 2}),
        };

        assert!(evaluate_case(success(r#"{"a": 1, "b": 2}"#), &case).passed);
        assert!(!evaluate_case(success(r#"{"b": 2, "a": 1}"#), &case).passed);
    }

    #[test]
    fn test_integer_and_float_are_distinct() {
        let case = TestCase {
            input: json!(null),
            expected: json!(5),
        };

        assert!(evaluate_case(success("5"), &case).passed);
        assert!(!evaluate_case(success("5.0"), &case).passed);
    }

    #[test]
    fn test_runtime_failure_carries_stderr_verbatim() {
        let outcome = ExecutionOutcome::RuntimeFailure {
            detail: "ZeroDivisionError: division by zero".to_string(),
            partial_stdout: "partial\n".to_string(),
        };
        let verdict = evaluate_case(outcome, &two_sum_case());

        assert!(!verdict.passed);
        assert_eq!(
            verdict.error.as_deref(),
            Some("ZeroDivisionError: division by zero")
        );
        assert_eq!(verdict.actual, "ZeroDivisionError: division by zero");
        assert_eq!(verdict.elapsed_ms, None);
    }

    #[test]
    fn test_compile_failure_verdict() {
        let outcome = ExecutionOutcome::CompileFailure {
            detail: "SyntaxError: invalid syntax".to_string(),
        };
        let verdict = evaluate_case(outcome, &two_sum_case());

        assert!(!verdict.passed);
        assert_eq!(verdict.actual, "SyntaxError: invalid syntax");
        assert_eq!(verdict.error.as_deref(), Some("SyntaxError: invalid syntax"));
    }

    #[test]
    fn test_transport_failure_verdict() {
        let outcome = ExecutionOutcome::TransportFailure {
            detail: "timeout".to_string(),
        };
        let verdict = evaluate_case(outcome, &two_sum_case());

        assert!(!verdict.passed);
        assert_eq!(verdict.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_empty_failure_detail_uses_sentinel() {
        let outcome = ExecutionOutcome::CompileFailure {
            detail: "  ".to_string(),
        };
        let verdict = evaluate_case(outcome, &two_sum_case());

        assert_eq!(verdict.actual, "Execution failed");
        assert_eq!(verdict.error.as_deref(), Some("Execution failed"));
    }

    #[test]
    fn test_synthesis_failure_verdict() {
        let verdict = failed_case(&two_sum_case(), "No function definition found in code");

        assert!(!verdict.passed);
        assert_eq!(verdict.input, r#"{"nums":[2,7,11,15],"target":9}"#);
        assert_eq!(
            verdict.error.as_deref(),
            Some("No function definition found in code")
        );
    }
}
