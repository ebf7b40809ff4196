//! Plan generation: turns wedding details into narrative plan text.
//!
//! Generation never fails from the caller's point of view. Provider errors
//! are logged and downgraded to [`GeneratedPlan::Fallback`], so every plan
//! record always carries some text.

use std::sync::Arc;

use tracing::{debug, error, warn};

use bouquet_db::models::PlanInput;

use crate::llm::{ChatClient, ChatMessage, ChatRequest, LlmConfig};
use crate::plan::prompt::build_plan_prompt;

/// Text stored when the provider answers without any usable content.
pub const PLACEHOLDER_PLAN: &str = "A wedding plan will appear here.";

/// Text stored when the provider call fails.
pub const FALLBACK_PLAN: &str =
    "We couldn't generate the AI plan at the moment. Please try again later.";

/// Sampling temperature for plan generation.
pub const PLAN_TEMPERATURE: f32 = 0.7;

/// Outcome of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedPlan {
    /// The provider returned text (already trimmed, never empty).
    Generated(String),
    /// The provider answered but the first choice had no text.
    Empty,
    /// The provider call failed; `reason` is the logged error.
    Fallback { reason: String },
}

impl GeneratedPlan {
    /// The text to store and return to the client.
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Empty => PLACEHOLDER_PLAN,
            Self::Fallback { .. } => FALLBACK_PLAN,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            other => other.text().to_owned(),
        }
    }

    /// True only when real model output was produced.
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

/// Writes wedding plans with an injected [`ChatClient`].
#[derive(Clone)]
pub struct PlanGenerator {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Use the model named in `config`.
    pub fn from_config(client: Arc<dyn ChatClient>, config: &LlmConfig) -> Self {
        Self::new(client, config.model.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a plan for `input`. Never returns an error.
    pub async fn generate(&self, input: &PlanInput) -> GeneratedPlan {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(build_plan_prompt(input))],
            temperature: PLAN_TEMPERATURE,
        };

        debug!(provider = self.client.name(), model = %self.model, "generate: requesting plan");

        match self.client.complete(request).await {
            Ok(response) => match response.content.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => GeneratedPlan::Generated(text.to_owned()),
                _ => {
                    warn!(provider = self.client.name(), "plan generation returned no text");
                    GeneratedPlan::Empty
                }
            },
            Err(e) => {
                error!(
                    provider = self.client.name(),
                    auth_failure = e.is_auth_failure(),
                    error = %e,
                    "plan generation failed"
                );
                GeneratedPlan::Fallback {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for PlanGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanGenerator")
            .field("client", &self.client.name())
            .field("model", &self.model)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
