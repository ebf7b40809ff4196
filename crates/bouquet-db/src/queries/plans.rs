//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{Plan, PlanInput, PlanUpdate};

/// Returned (inside an [`anyhow::Error`]) when a share ID is already taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("share id {0:?} is already taken")]
pub struct DuplicateShareId(pub String);

/// Insert a new plan row. Returns the inserted plan with server-generated
/// defaults (id, created_at, updated_at).
///
/// A unique-constraint violation on `share_id` is reported as
/// [`DuplicateShareId`] so callers can tell it apart from other failures.
pub async fn insert_plan(
    pool: &PgPool,
    share_id: &str,
    input: &PlanInput,
    ai_plan: &str,
) -> Result<Plan> {
    let result = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans \
         (share_id, couple_names, wedding_date, location, budget, notes, guests, vendors, invitations, ai_plan) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(share_id)
    .bind(input.couple_names.as_deref())
    .bind(input.wedding_date.as_deref())
    .bind(input.location.as_deref())
    .bind(input.budget.as_deref())
    .bind(input.notes.as_deref())
    .bind(input.guests.as_deref())
    .bind(input.vendors.as_deref())
    .bind(input.invitations.as_deref())
    .bind(ai_plan)
    .fetch_one(pool)
    .await;

    match result {
        Ok(plan) => Ok(plan),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(DuplicateShareId(share_id.to_owned()).into())
        }
        Err(e) => Err(anyhow::Error::new(e).context("failed to insert plan")),
    }
}

/// Fetch a plan by its share ID.
pub async fn get_plan_by_share_id(pool: &PgPool, share_id: &str) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE share_id = $1")
        .bind(share_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Merge `update` into the plan with the given share ID.
///
/// Only fields present in the update are overwritten; `updated_at` is
/// always bumped. Returns `None` when no plan matches.
pub async fn update_plan_by_share_id(
    pool: &PgPool,
    share_id: &str,
    update: &PlanUpdate,
) -> Result<Option<Plan>> {
    let input = &update.input;
    let plan = sqlx::query_as::<_, Plan>(
        "UPDATE plans SET \
             couple_names = COALESCE($2, couple_names), \
             wedding_date = COALESCE($3, wedding_date), \
             location = COALESCE($4, location), \
             budget = COALESCE($5, budget), \
             notes = COALESCE($6, notes), \
             guests = COALESCE($7, guests), \
             vendors = COALESCE($8, vendors), \
             invitations = COALESCE($9, invitations), \
             ai_plan = COALESCE($10, ai_plan), \
             updated_at = now() \
         WHERE share_id = $1 \
         RETURNING *",
    )
    .bind(share_id)
    .bind(input.couple_names.as_deref())
    .bind(input.wedding_date.as_deref())
    .bind(input.location.as_deref())
    .bind(input.budget.as_deref())
    .bind(input.notes.as_deref())
    .bind(input.guests.as_deref())
    .bind(input.vendors.as_deref())
    .bind(input.invitations.as_deref())
    .bind(update.ai_plan.as_deref())
    .fetch_optional(pool)
    .await
    .context("failed to update plan")?;

    Ok(plan)
}
