/// Grading Orchestrator - High-Level Pipeline
///
/// **Responsibility:**
/// Coordinate harness synthesis, sandbox execution, and verdict evaluation
/// across a submission's test cases and produce the final report.
///
/// **Architecture:**
/// 1. Synthesize a program per test case (harness.rs)
/// 2. Dispatch it to the execution backend (sandbox.rs)
/// 3. Evaluate the outcome into a verdict (evaluator.rs)
///
/// This module is the glue layer - it knows nothing about:
/// - How programs are built (harness's job)
/// - How the sandbox is reached (backend's job)
/// - How outputs are compared (evaluator's job)
///
/// **Failure Semantics:**
/// Per-case failures of any kind become failed verdicts; the run keeps going.
/// The only `Err` surfaces are caller-precondition violations and
/// cancellation. Even a full sandbox blackout yields a normal report with a
/// zero score, so callers always have a uniform shape to render.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use arbiter_common::types::{GradingReport, Submission, TestCase};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{RuntimeRegistry, SandboxConfig};
use crate::evaluator;
use crate::harness;
use crate::sandbox::{ExecutionBackend, ExecutionOutcome, SandboxClient};

#[derive(Debug, Error)]
pub enum GradeError {
    /// Grading with zero test cases is a caller error, not a silent 100%.
    #[error("no test cases supplied")]
    NoTestCases,

    #[error("no runtime configured for language: {0}")]
    UnsupportedLanguage(String),

    /// The caller cancelled the run; no report is produced.
    #[error("grading run cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between a caller and a running grade.
/// Checked between test cases: cancelling stops further sandbox calls and the
/// run returns [`GradeError::Cancelled`] instead of a partial report.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One grading engine instance. Holds no per-run state, so a single `Grader`
/// can serve unrelated submissions concurrently; each run owns its own
/// verdict accumulation.
pub struct Grader<B = SandboxClient> {
    backend: B,
    runtimes: RuntimeRegistry,
}

impl Grader<SandboxClient> {
    pub fn new(sandbox: &SandboxConfig, runtimes: RuntimeRegistry) -> Result<Self> {
        Ok(Self {
            backend: SandboxClient::new(sandbox)?,
            runtimes,
        })
    }
}

impl<B: ExecutionBackend> Grader<B> {
    /// Build a grader over an arbitrary execution backend.
    pub fn with_backend(backend: B, runtimes: RuntimeRegistry) -> Self {
        Self { backend, runtimes }
    }

    /// Grade a submission against an ordered, non-empty test-case set.
    ///
    /// Test cases run strictly sequentially, one sandbox round trip at a
    /// time, and `report.verdicts[i]` always corresponds to `test_cases[i]`.
    pub async fn grade(
        &self,
        submission: &Submission,
        test_cases: &[TestCase],
    ) -> Result<GradingReport, GradeError> {
        self.grade_with_cancel(submission, test_cases, &CancelFlag::new())
            .await
    }

    #[instrument(
        skip(self, submission, test_cases, cancel),
        fields(
            submission_id = %submission.id,
            language = %submission.language,
            case_count = test_cases.len(),
        )
    )]
    pub async fn grade_with_cancel(
        &self,
        submission: &Submission,
        test_cases: &[TestCase],
        cancel: &CancelFlag,
    ) -> Result<GradingReport, GradeError> {
        if test_cases.is_empty() {
            return Err(GradeError::NoTestCases);
        }

        let runtime = self
            .runtimes
            .get(submission.language)
            .ok_or_else(|| GradeError::UnsupportedLanguage(submission.language.to_string()))?;

        info!("starting grading run");
        let started = Instant::now();

        let mut verdicts = Vec::with_capacity(test_cases.len());
        let mut passed_count = 0usize;

        for (index, case) in test_cases.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(completed = verdicts.len(), "grading run cancelled");
                return Err(GradeError::Cancelled);
            }

            let verdict = match harness::synthesize_program(
                submission.language,
                &submission.source_code,
                &case.input,
            ) {
                Ok(program) => {
                    debug!(case = index, "dispatching test case");
                    let outcome = self.backend.execute(runtime, &program).await;
                    if let ExecutionOutcome::TransportFailure { detail } = &outcome {
                        warn!(case = index, detail = %detail, "sandbox unreachable for test case");
                    }
                    evaluator::evaluate_case(outcome, case)
                }
                Err(e) => {
                    warn!(case = index, error = %e, "harness synthesis failed");
                    evaluator::failed_case(case, &e.to_string())
                }
            };

            debug!(case = index, passed = verdict.passed, "test case evaluated");
            if verdict.passed {
                passed_count += 1;
            }
            verdicts.push(verdict);
        }

        let total_count = verdicts.len();
        let report = GradingReport {
            submission_id: submission.id,
            score_percent: GradingReport::compute_score(passed_count, total_count),
            passed_count,
            total_count,
            verdicts,
            total_elapsed_ms: started.elapsed().as_millis() as u64,
            graded_at: Utc::now(),
        };

        info!(
            score_percent = report.score_percent,
            passed = passed_count,
            total = total_count,
            "grading run complete"
        );

        Ok(report)
    }
}
