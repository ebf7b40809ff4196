//! The `PlanStore` trait -- the storage interface the plan service runs on.
//!
//! [`PgPlanStore`] is the production implementation. The trait is
//! object-safe so handlers can hold an `Arc<dyn PlanStore>` and tests can
//! substitute an in-memory store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{Plan, PlanInput, PlanUpdate};
use crate::queries::plans as plan_queries;

/// Storage for plan records, addressed by share ID.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Persist a new plan.
    ///
    /// Fails with [`plan_queries::DuplicateShareId`] if `share_id` is
    /// already in use.
    async fn insert(&self, share_id: &str, input: &PlanInput, ai_plan: &str) -> Result<Plan>;

    /// Look up a plan. `Ok(None)` means no plan has this share ID.
    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<Plan>>;

    /// Merge `update` into an existing plan and bump `updated_at`.
    ///
    /// `Ok(None)` means no plan has this share ID.
    async fn update_by_share_id(&self, share_id: &str, update: &PlanUpdate)
    -> Result<Option<Plan>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore) {}
};

/// [`PlanStore`] backed by the PostgreSQL `plans` table.
#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn insert(&self, share_id: &str, input: &PlanInput, ai_plan: &str) -> Result<Plan> {
        plan_queries::insert_plan(&self.pool, share_id, input, ai_plan).await
    }

    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<Plan>> {
        plan_queries::get_plan_by_share_id(&self.pool, share_id).await
    }

    async fn update_by_share_id(
        &self,
        share_id: &str,
        update: &PlanUpdate,
    ) -> Result<Option<Plan>> {
        plan_queries::update_plan_by_share_id(&self.pool, share_id, update).await
    }
}
