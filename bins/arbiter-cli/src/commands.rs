// CLI command implementations
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

use arbiter_common::types::{Language, Submission, TestCase};
use arbiter_engine::config::{RuntimeRegistry, SandboxConfig};
use arbiter_engine::grader::Grader;

/// Load the runtime registry from a file, or fall back to built-in defaults.
fn load_registry(path: Option<&Path>) -> Result<RuntimeRegistry> {
    match path {
        Some(path) => RuntimeRegistry::load(path),
        None => Ok(RuntimeRegistry::builtin()),
    }
}

/// Grade a submission and render the report. Exits with status 1 when the
/// submission did not pass every test case.
pub async fn grade(
    source: &Path,
    language: &str,
    tests: &Path,
    sandbox_url: Option<&str>,
    timeout_secs: u64,
    runtimes: Option<&Path>,
) -> Result<()> {
    let Some(language) = Language::from_str(language) else {
        bail!(
            "Unsupported language '{}' (expected one of: {})",
            language,
            Language::all()
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let source_code = fs::read_to_string(source)
        .with_context(|| format!("Failed to read source file {}", source.display()))?;

    let tests_raw = fs::read_to_string(tests)
        .with_context(|| format!("Failed to read test-case file {}", tests.display()))?;
    let test_cases: Vec<TestCase> =
        serde_json::from_str(&tests_raw).context("Failed to parse test-case file")?;

    let registry = load_registry(runtimes)?;

    let mut sandbox = SandboxConfig::from_env();
    if let Some(url) = sandbox_url {
        sandbox.base_url = url.to_string();
    }
    sandbox.request_timeout = Duration::from_secs(timeout_secs);

    let submission = Submission::new(language, source_code);
    let grader = Grader::new(&sandbox, registry)?;

    println!(
        "→ Grading submission {} ({}, {} test cases)",
        submission.id,
        submission.language,
        test_cases.len()
    );
    println!();

    let report = grader.grade(&submission, &test_cases).await?;

    for (idx, verdict) in report.verdicts.iter().enumerate() {
        if verdict.passed {
            println!(
                "  ✓ Test {} passed ({}ms)",
                idx + 1,
                verdict.elapsed_ms.unwrap_or(0)
            );
        } else {
            println!("  ✗ Test {} failed", idx + 1);
            println!("    Input:    {}", verdict.input);
            println!("    Expected: {}", verdict.expected);
            println!("    Got:      {}", verdict.actual);
            if let Some(error) = &verdict.error {
                println!("    Error:    {}", error.lines().next().unwrap_or(""));
            }
        }
    }

    println!();
    println!(
        "→ Score: {}% ({}/{} passed, {}ms total)",
        report.score_percent, report.passed_count, report.total_count, report.total_elapsed_ms
    );

    if report.solved() {
        println!("  ✓ All test cases passed");
    } else {
        std::process::exit(1);
    }

    Ok(())
}

/// List the languages the registry can dispatch to.
pub fn list_languages(runtimes: Option<&Path>) -> Result<()> {
    let registry = load_registry(runtimes)?;

    let mut languages = registry.languages();
    languages.sort_by_key(|l| l.to_string());

    println!("Configured runtimes:");
    for language in languages {
        if let Some(spec) = registry.get(language) {
            println!("  {} → {} {}", language, spec.name, spec.version);
        }
    }

    Ok(())
}
