//! Optimizer service: the remote operations of the API, each run through the
//! shared `ResilientExecutor`.
//!
//! Flow per request: render prompt → executor runs `ChatModel::complete` under the
//! retry policy → parse the model text into the response payload. The whole retry
//! sequence is bounded by the request deadline; `None` means it was abandoned.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, PROBE_PROMPT, PROBE_SYSTEM};
use crate::llm_client::{strip_json_fences, ChatModel};
use crate::optimizer::prompts::{
    render, ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM, COVER_LETTER_PROMPT_TEMPLATE,
    COVER_LETTER_SYSTEM,
};
use crate::resilience::{ExecutionOutcome, ResilientExecutor, RetryPolicy};

/// `short_version` falls back to this many characters of unparseable output.
const SHORT_FALLBACK_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverLetters {
    #[serde(default)]
    pub short_version: String,
    #[serde(default)]
    pub long_version: String,
}

/// Cheap to clone: the model is shared, the executor is `Copy`.
#[derive(Clone)]
pub struct OptimizerService {
    model: Arc<dyn ChatModel>,
    executor: ResilientExecutor,
    deadline: Duration,
}

impl OptimizerService {
    pub fn new(model: Arc<dyn ChatModel>, policy: RetryPolicy, deadline: Duration) -> Self {
        Self {
            model,
            executor: ResilientExecutor::new(policy),
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Runs one system + user prompt through the retry policy. The in-flight call
    /// or pending backoff is dropped once the deadline passes.
    async fn run(&self, system: String, prompt: String) -> Option<ExecutionOutcome<String>> {
        self.executor
            .execute_until(
                || {
                    let model = Arc::clone(&self.model);
                    let system = system.clone();
                    let prompt = prompt.clone();
                    async move { model.complete(&system, &prompt).await }
                },
                tokio::time::sleep(self.deadline),
            )
            .await
    }

    /// Résumé analysis. The payload is the model's JSON, or its raw text when the
    /// output is not valid JSON.
    pub async fn analyze(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Option<ExecutionOutcome<Value>> {
        info!(
            "Analyzing resume ({} chars) against job description ({} chars)",
            resume_text.len(),
            job_description.len()
        );
        let prompt = render(ANALYSIS_PROMPT_TEMPLATE, job_description, resume_text);
        self.run(json_system(ANALYSIS_SYSTEM), prompt)
            .await
            .map(|outcome| outcome.map(|text| parse_analysis(&text)))
    }

    /// Short and long cover letters.
    pub async fn cover_letters(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Option<ExecutionOutcome<CoverLetters>> {
        info!("Generating cover letters");
        let prompt = render(COVER_LETTER_PROMPT_TEMPLATE, job_description, resume_text);
        self.run(json_system(COVER_LETTER_SYSTEM), prompt)
            .await
            .map(|outcome| outcome.map(|text| parse_cover_letters(&text)))
    }

    /// Connectivity check against the configured model.
    pub async fn probe(&self) -> Option<ExecutionOutcome<String>> {
        self.run(PROBE_SYSTEM.to_string(), PROBE_PROMPT.to_string())
            .await
            .map(|outcome| outcome.map(|text| text.trim().to_string()))
    }
}

fn json_system(system: &str) -> String {
    format!("{system}\n\n{JSON_ONLY_INSTRUCTION}")
}

pub fn parse_analysis(text: &str) -> Value {
    let cleaned = strip_json_fences(text);
    serde_json::from_str(cleaned).unwrap_or_else(|e| {
        warn!("Analysis output is not valid JSON ({e}); returning raw text");
        Value::String(cleaned.to_string())
    })
}

pub fn parse_cover_letters(text: &str) -> CoverLetters {
    let cleaned = strip_json_fences(text);
    match serde_json::from_str::<CoverLetters>(cleaned) {
        Ok(letters) => letters,
        Err(e) => {
            warn!("Cover letter output is not the expected JSON ({e}); using raw text");
            let short_version = match cleaned.char_indices().nth(SHORT_FALLBACK_CHARS) {
                Some((idx, _)) => format!("{}...", &cleaned[..idx]),
                None => cleaned.to_string(),
            };
            CoverLetters {
                short_version,
                long_version: cleaned.to_string(),
            }
        }
    }
}
