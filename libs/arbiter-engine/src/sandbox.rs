/// Execution Client - Sandbox Dispatch and Outcome Classification
///
/// **Core Responsibility:**
/// Submit one synthesized program to the external execution sandbox over
/// HTTP and classify the structured response.
///
/// **Critical Architectural Boundary:**
/// - The client knows HOW to reach the sandbox and read its wire format
/// - The client does NOT evaluate correctness (evaluator's job)
/// - The client never lets a failure escape as an error: every failure mode
///   is represented as an [`ExecutionOutcome`] value, so one dead network
///   call can never abort the remaining test cases
///
/// **Classification Rules, in order:**
/// 1. Transport/HTTP failure (network error, timeout, non-2xx, malformed
///    body) → `TransportFailure`
/// 2. Compile stage present with non-zero exit → `CompileFailure`
/// 3. Run stage non-zero exit OR non-empty stderr → `RuntimeFailure`
/// 4. Otherwise → `Success` with trimmed stdout
///
/// **Timing:**
/// Elapsed time is client-observed wall clock around the network call; the
/// sandbox's own timing is not trusted (it may be absent, and network latency
/// is part of what users perceive as "runtime").
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{RuntimeSpec, SandboxConfig};

/// Execute request wire shape: one file, no stdin, runtime selected by
/// name + version.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSpec {
    pub content: String,
}

/// Execute response wire shape. The `compile` stage is present only for
/// compiled-language runtimes; its absence means "skip straight to run-stage
/// classification".
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    pub run: StageReport,
    #[serde(default)]
    pub compile: Option<StageReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageReport {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub signal: Option<String>,
}

/// What one sandbox round trip produced. Built fresh per test case.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    CompileFailure { detail: String },
    RuntimeFailure { detail: String, partial_stdout: String },
    TransportFailure { detail: String },
    Success { stdout: String, elapsed_ms: u64 },
}

/// Seam between the orchestrator and the execution mechanism, so scoring
/// logic can be exercised against a scripted in-memory backend.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn execute(&self, runtime: &RuntimeSpec, program: &str) -> ExecutionOutcome;
}

/// HTTP client for the external execution sandbox. One underlying reqwest
/// client, reused across calls; the per-call timeout is enforced at the
/// client level.
pub struct SandboxClient {
    http: reqwest::Client,
    base_url: String,
}

impl SandboxClient {
    pub fn new(config: &SandboxConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build sandbox HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ExecutionBackend for SandboxClient {
    async fn execute(&self, runtime: &RuntimeSpec, program: &str) -> ExecutionOutcome {
        let request = ExecuteRequest {
            language: runtime.name.clone(),
            version: runtime.version.clone(),
            files: vec![FileSpec {
                content: program.to_string(),
            }],
        };

        debug!(
            runtime = %runtime.name,
            version = %runtime.version,
            program_bytes = program.len(),
            "dispatching program to sandbox"
        );

        let started = Instant::now();
        let response = self.http.post(&self.base_url).json(&request).send().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(elapsed_ms, "sandbox call timed out");
                return ExecutionOutcome::TransportFailure {
                    detail: "timeout".to_string(),
                };
            }
            Err(e) => {
                warn!(error = %e, "sandbox call failed");
                return ExecutionOutcome::TransportFailure {
                    detail: e.to_string(),
                };
            }
        };

        if !response.status().is_success() {
            return ExecutionOutcome::TransportFailure {
                detail: format!("sandbox returned HTTP {}", response.status()),
            };
        }

        let decoded: ExecuteResponse = match response.json().await {
            Ok(decoded) => decoded,
            Err(e) => {
                return ExecutionOutcome::TransportFailure {
                    detail: format!("malformed sandbox response: {}", e),
                };
            }
        };

        classify(decoded, elapsed_ms)
    }
}

/// Classify a decoded sandbox response. Pure so the rules stay testable
/// without a network.
pub fn classify(response: ExecuteResponse, elapsed_ms: u64) -> ExecutionOutcome {
    if let Some(compile) = response.compile {
        if compile.code != 0 {
            let detail = if compile.stderr.is_empty() {
                compile.stdout
            } else {
                compile.stderr
            };
            return ExecutionOutcome::CompileFailure { detail };
        }
    }

    let run = response.run;
    if run.code != 0 || !run.stderr.is_empty() {
        let detail = if run.stderr.is_empty() {
            format!("exit code: {}", run.code)
        } else {
            run.stderr
        };
        return ExecutionOutcome::RuntimeFailure {
            detail,
            partial_stdout: run.stdout,
        };
    }

    ExecutionOutcome::Success {
        stdout: run.stdout.trim().to_string(),
        elapsed_ms,
    }
}
