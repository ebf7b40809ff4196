//! Wedding plans: prompt construction, generation and the service layer.

pub mod generate;
pub mod prompt;
pub mod service;

pub use generate::{FALLBACK_PLAN, GeneratedPlan, PLACEHOLDER_PLAN, PlanGenerator};
pub use prompt::build_plan_prompt;
pub use service::{CreatedPlan, create_plan, get_plan, is_share_id, new_share_id, update_plan};
