//! Patch generation with validation retries and model fallback.
//!
//! The loop state is `(attempt, model_index)`:
//!
//! | outcome               | next state                         |
//! |-----------------------|------------------------------------|
//! | valid plan            | done                               |
//! | schema violations     | `(attempt + 1, model_index)`       |
//! | model unavailable     | `(attempt, model_index + 1)`       |
//! | any other model error | fail                               |
//!
//! Schema failures re-prompt with the rejected response and its violations.
//! Falling back to another model repeats the same prompt and does not spend
//! an attempt.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::model::{DEFAULT_MAX_TOKENS, ModelClient, ModelError, ModelRequest};
use super::plan::PatchPlan;
use super::prompt::{Prompt, build_retry_prompt};
use super::validate::{PlanRules, SchemaViolation, parse_plan};

/// Attempts allowed before schema failures become terminal.
pub const MAX_ATTEMPTS: u32 = 3;

/// Errors that end generation.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Every attempt produced an unusable response.
    #[error("model output failed validation after {attempts} attempts: {}", render(.violations))]
    SchemaValidation {
        attempts: u32,
        violations: Vec<SchemaViolation>,
    },

    /// No model in the priority list was recognised.
    #[error("no model available (tried {})", .tried.join(", "))]
    NoModelAvailable { tried: Vec<String> },

    /// The provider failed in a way fallback can't fix.
    #[error(transparent)]
    Model(ModelError),
}

fn render(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Observability data about a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationMetadata {
    pub model: String,
    pub attempts: u32,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// A validated plan and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPatch {
    pub plan: PatchPlan,
    pub metadata: GenerationMetadata,
}

/// Drives a `ModelClient` until it yields a valid plan.
pub struct PatchGenerator<M> {
    client: M,
    models: Vec<String>,
    max_tokens: u32,
}

impl<M: ModelClient> PatchGenerator<M> {
    pub fn new(client: M, models: Vec<String>) -> Self {
        PatchGenerator {
            client,
            models,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub async fn generate(
        &self,
        prompt: &Prompt,
        rules: &PlanRules,
    ) -> Result<GeneratedPatch, PatchError> {
        let mut attempt = 1;
        let mut model_index = 0;
        let mut current = prompt.clone();
        let mut input_tokens = None;
        let mut output_tokens = None;

        loop {
            let Some(model) = self.models.get(model_index) else {
                return Err(PatchError::NoModelAvailable {
                    tried: self.models.clone(),
                });
            };

            let request = ModelRequest {
                model: model.clone(),
                system: current.system.clone(),
                user: current.user.clone(),
                max_tokens: self.max_tokens,
            };

            let response = match self.client.complete(request).await {
                Ok(response) => response,
                Err(ModelError::ModelUnavailable { message, .. }) => {
                    warn!(model = %model, attempt, message = %message, "Model unavailable, falling back");
                    model_index += 1;
                    continue;
                }
                Err(e) => return Err(PatchError::Model(e)),
            };

            input_tokens = add_usage(input_tokens, response.input_tokens);
            output_tokens = add_usage(output_tokens, response.output_tokens);

            match parse_plan(&response.text, rules) {
                Ok(plan) => {
                    let metadata = GenerationMetadata {
                        model: model.clone(),
                        attempts: attempt,
                        input_tokens,
                        output_tokens,
                    };
                    info!(
                        model = %metadata.model,
                        attempts = metadata.attempts,
                        input_tokens = ?metadata.input_tokens,
                        output_tokens = ?metadata.output_tokens,
                        changes = plan.file_changes.len(),
                        "Generated patch plan"
                    );
                    return Ok(GeneratedPatch { plan, metadata });
                }
                Err(violations) => {
                    warn!(
                        model = %model,
                        attempt,
                        violations = %render(&violations),
                        "Model output failed validation"
                    );
                    if attempt >= MAX_ATTEMPTS {
                        return Err(PatchError::SchemaValidation {
                            attempts: attempt,
                            violations,
                        });
                    }
                    current = build_retry_prompt(prompt, &response.text, &violations);
                    attempt += 1;
                }
            }
        }
    }
}

fn add_usage(total: Option<u64>, more: Option<u64>) -> Option<u64> {
    match (total, more) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}
