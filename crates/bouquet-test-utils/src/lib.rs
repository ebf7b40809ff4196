//! Shared test utilities for bouquet tests.
//!
//! - [`pg`]: PostgreSQL databases for integration tests.
//! - [`MemoryPlanStore`]: an in-memory [`PlanStore`] for router and
//!   service tests that do not need a database.
//! - [`ScriptedChatClient`]: a [`ChatClient`] that replays canned replies.

pub mod pg;

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use bouquet_core::llm::{ChatClient, ChatRequest, ChatResponse, LlmError};
use bouquet_db::models::{Plan, PlanInput, PlanUpdate};
use bouquet_db::queries::plans::DuplicateShareId;
use bouquet_db::store::PlanStore;

pub use pg::{create_test_db, drop_test_db, pg_url};

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// [`PlanStore`] kept in a `HashMap`, with the same merge semantics as
/// the PostgreSQL implementation.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: Mutex<HashMap<String, Plan>>,
    fail_writes: Mutex<bool>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert/update fail, simulating a lost database.
    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn len(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            anyhow::bail!("simulated storage failure");
        }
        Ok(())
    }
}

fn merge(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn insert(&self, share_id: &str, input: &PlanInput, ai_plan: &str) -> Result<Plan> {
        self.check_writable()?;
        let mut plans = self.plans.lock().unwrap();
        if plans.contains_key(share_id) {
            return Err(DuplicateShareId(share_id.to_owned()).into());
        }
        let now = Utc::now();
        let plan = Plan {
            id: Uuid::new_v4(),
            share_id: share_id.to_owned(),
            couple_names: input.couple_names.clone(),
            wedding_date: input.wedding_date.clone(),
            location: input.location.clone(),
            budget: input.budget.clone(),
            notes: input.notes.clone(),
            guests: input.guests.clone(),
            vendors: input.vendors.clone(),
            invitations: input.invitations.clone(),
            ai_plan: Some(ai_plan.to_owned()),
            created_at: now,
            updated_at: now,
        };
        plans.insert(share_id.to_owned(), plan.clone());
        Ok(plan)
    }

    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<Plan>> {
        Ok(self.plans.lock().unwrap().get(share_id).cloned())
    }

    async fn update_by_share_id(
        &self,
        share_id: &str,
        update: &PlanUpdate,
    ) -> Result<Option<Plan>> {
        self.check_writable()?;
        let mut plans = self.plans.lock().unwrap();
        let Some(plan) = plans.get_mut(share_id) else {
            return Ok(None);
        };
        let input = &update.input;
        merge(&mut plan.couple_names, &input.couple_names);
        merge(&mut plan.wedding_date, &input.wedding_date);
        merge(&mut plan.location, &input.location);
        merge(&mut plan.budget, &input.budget);
        merge(&mut plan.notes, &input.notes);
        merge(&mut plan.guests, &input.guests);
        merge(&mut plan.vendors, &input.vendors);
        merge(&mut plan.invitations, &input.invitations);
        merge(&mut plan.ai_plan, &update.ai_plan);
        plan.updated_at = Utc::now();
        Ok(Some(plan.clone()))
    }
}

// ---------------------------------------------------------------------------
// Scripted chat client
// ---------------------------------------------------------------------------

/// One canned provider reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    NoContent,
    Fail(String),
}

/// [`ChatClient`] that pops replies from a queue (repeating the last one
/// once the queue is down to a single entry) and records every request.
#[derive(Debug)]
pub struct ScriptedChatClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatClient {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new([Reply::Text(text.into())])
    }

    /// Always fail as if the network were down.
    pub fn failing() -> Self {
        Self::new([Reply::Fail("connection refused".to_string())])
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The prompt text of every request received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.messages.into_iter().next().map(|m| m.content))
            .collect()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap_or(Reply::NoContent)
        } else {
            replies.front().cloned().unwrap_or(Reply::NoContent)
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.next_reply() {
            Reply::Text(text) => Ok(ChatResponse::text(text)),
            Reply::NoContent => Ok(ChatResponse::default()),
            Reply::Fail(message) => Err(LlmError::InvalidResponse(message)),
        }
    }
}
