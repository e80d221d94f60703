// Sandbox endpoint and runtime configuration
use anyhow::{bail, Context, Result};
use arbiter_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Public Piston-compatible execute endpoint used when nothing else is
/// configured.
pub const DEFAULT_SANDBOX_URL: &str = "https://emkc.org/api/v2/piston/execute";

/// Environment variable overriding the sandbox endpoint.
pub const SANDBOX_URL_ENV: &str = "ARBITER_SANDBOX_URL";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Runtime identifier understood by the execution sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuntimesFile {
    runtimes: Vec<RuntimeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuntimeEntry {
    language: String,
    name: String,
    version: String,
}

/// Registry mapping each enabled [`Language`] to the sandbox runtime it
/// executes on. This is the authoritative source for which languages are
/// enabled; a language missing here is rejected before any network activity.
#[derive(Debug, Clone)]
pub struct RuntimeRegistry {
    specs: HashMap<Language, RuntimeSpec>,
}

impl RuntimeRegistry {
    /// Built-in defaults for all known languages.
    pub fn builtin() -> Self {
        let mut specs = HashMap::new();
        specs.insert(
            Language::Python,
            RuntimeSpec {
                name: "python".to_string(),
                version: "3.10".to_string(),
            },
        );
        specs.insert(
            Language::Javascript,
            RuntimeSpec {
                name: "javascript".to_string(),
                version: "18.15".to_string(),
            },
        );
        Self { specs }
    }

    /// Load runtime mappings from a runtimes.json file.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("runtime config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path).context("Failed to read runtimes.json")?;
        let parsed: RuntimesFile =
            serde_json::from_str(&content).context("Failed to parse runtimes.json")?;

        let mut specs = HashMap::new();
        for entry in parsed.runtimes {
            match Language::from_str(&entry.language) {
                Some(language) => {
                    specs.insert(
                        language,
                        RuntimeSpec {
                            name: entry.name,
                            version: entry.version,
                        },
                    );
                }
                None => {
                    bail!("Unknown language '{}' in runtimes.json", entry.language);
                }
            }
        }

        if specs.is_empty() {
            bail!("No runtimes configured in runtimes.json");
        }

        Ok(Self { specs })
    }

    /// Get the runtime for a language, if enabled.
    pub fn get(&self, language: Language) -> Option<&RuntimeSpec> {
        self.specs.get(&language)
    }

    /// List all enabled languages.
    pub fn languages(&self) -> Vec<Language> {
        self.specs.keys().copied().collect()
    }
}

/// Connection settings for the external execution sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl SandboxConfig {
    /// Default endpoint, honoring the `ARBITER_SANDBOX_URL` override.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(SANDBOX_URL_ENV).unwrap_or_else(|_| DEFAULT_SANDBOX_URL.to_string());
        Self {
            base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SANDBOX_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
