use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Plan record
// ---------------------------------------------------------------------------

/// A persisted wedding plan.
///
/// Serialized in camelCase to match the HTTP contract. The surrogate `id`
/// never leaves the storage layer; clients address plans by `share_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(skip)]
    pub id: Uuid,
    pub share_id: String,
    pub couple_names: Option<String>,
    pub wedding_date: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub notes: Option<String>,
    pub guests: Option<String>,
    pub vendors: Option<String>,
    pub invitations: Option<String>,
    pub ai_plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Free-form wedding details supplied by a client.
///
/// Every field is optional. Unknown keys in a request body are ignored, so
/// `shareId`, `aiPlan` and the timestamps can never be set through this type.
/// Numbers and booleans are accepted and stored as their text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanInput {
    #[serde(deserialize_with = "scalar_text")]
    pub couple_names: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub wedding_date: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub budget: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub guests: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub vendors: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub invitations: Option<String>,
}

/// A JSON scalar that may stand in for a text field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
            Self::UInt(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// `null` stays `None`; strings, numbers and booleans become text.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

/// A partial update to an existing plan.
///
/// `None` fields are left untouched. `ai_plan` is only set when the caller
/// asked for a regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanUpdate {
    pub input: PlanInput,
    pub ai_plan: Option<String>,
}

impl PlanUpdate {
    /// An update that merges `input` and keeps the stored `ai_plan`.
    pub fn fields(input: PlanInput) -> Self {
        Self {
            input,
            ai_plan: None,
        }
    }

    /// Attach a freshly generated plan text.
    pub fn with_ai_plan(mut self, ai_plan: impl Into<String>) -> Self {
        self.ai_plan = Some(ai_plan.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
