//! Patch generation.
//!
//! A prompt built from the issue and repository context goes to the model;
//! the response must decode into a `PatchPlan` that satisfies the delivery's
//! rules. Invalid responses are sent back for correction a bounded number of
//! times, and unknown model ids fall back down a priority list.

pub mod generator;
pub mod model;
pub mod plan;
pub mod prompt;
pub mod validate;

pub use generator::{GeneratedPatch, GenerationMetadata, MAX_ATTEMPTS, PatchError, PatchGenerator};
pub use model::{
    AnthropicClient, DEFAULT_MODELS, ModelClient, ModelError, ModelRequest, ModelResponse,
};
pub use plan::{ChangeKind, FileChange, PatchPlan};
pub use prompt::{Prompt, PromptInput, build_prompt, build_retry_prompt, language_hint};
pub use validate::{
    MAX_TITLE_CHARS, PlanRules, SchemaViolation, decode_plan, parse_plan, strip_fences, validate,
};
