//! Plan service layer.
//!
//! Composes a [`PlanStore`] with the [`PlanGenerator`] for the three
//! operations the HTTP API exposes: create, fetch and update.

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use bouquet_db::models::{Plan, PlanInput, PlanUpdate};
use bouquet_db::store::PlanStore;

use super::generate::{GeneratedPlan, PlanGenerator};

/// Length of a share ID, in hex characters.
pub const SHARE_ID_LEN: usize = 8;

/// Generate a fresh share ID: the first eight hex digits of a random UUID.
pub fn new_share_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(SHARE_ID_LEN);
    id
}

/// True if `s` has the shape produced by [`new_share_id`].
pub fn is_share_id(s: &str) -> bool {
    s.len() == SHARE_ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A newly stored plan together with how its text was produced.
#[derive(Debug, Clone)]
pub struct CreatedPlan {
    pub plan: Plan,
    pub outcome: GeneratedPlan,
}

/// Generate a plan for `input` and store it under a fresh share ID.
///
/// Generation failures are absorbed into the stored text; only storage
/// errors are returned.
pub async fn create_plan(
    store: &dyn PlanStore,
    generator: &PlanGenerator,
    input: &PlanInput,
) -> Result<CreatedPlan> {
    let share_id = new_share_id();
    let outcome = generator.generate(input).await;

    let plan = store.insert(&share_id, input, outcome.text()).await?;

    info!(
        share_id = %plan.share_id,
        generated = outcome.is_generated(),
        "plan created"
    );
    Ok(CreatedPlan { plan, outcome })
}

/// Fetch a plan by share ID.
pub async fn get_plan(store: &dyn PlanStore, share_id: &str) -> Result<Option<Plan>> {
    store.find_by_share_id(share_id).await
}

/// Merge `input` into an existing plan.
///
/// With `regenerate`, a new plan text is generated from `input` (the
/// request's fields, not the stored ones) and replaces `ai_plan`. Unknown
/// share IDs are detected before generating so they never cost an LLM call.
pub async fn update_plan(
    store: &dyn PlanStore,
    generator: &PlanGenerator,
    share_id: &str,
    input: PlanInput,
    regenerate: bool,
) -> Result<Option<Plan>> {
    let mut update = PlanUpdate::fields(input);

    if regenerate {
        if store.find_by_share_id(share_id).await?.is_none() {
            return Ok(None);
        }
        let outcome = generator.generate(&update.input).await;
        info!(share_id, generated = outcome.is_generated(), "plan regenerated");
        update = update.with_ai_plan(outcome.into_text());
    }

    let plan = store.update_by_share_id(share_id, &update).await?;
    if plan.is_some() {
        info!(share_id, regenerate, "plan updated");
    }
    Ok(plan)
}
