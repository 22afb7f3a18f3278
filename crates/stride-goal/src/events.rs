// events.rs — Goal lifecycle event payloads.
//
// Wire field names are part of the consumer contract: payloads serialize
// camelCase and carry exactly the documented fields. The topic names the
// event kind, so payloads carry no type tag. All events for one goal share
// the goal id as partition key and are observed in emission order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stride_events::BusEvent;

use crate::goal::{Goal, GoalCategory};
use crate::progress::ProgressDelta;

pub const TOPIC_GOAL_CREATED: &str = "goal.created";
pub const TOPIC_GOAL_PROGRESS_UPDATED: &str = "goal.progress.updated";
pub const TOPIC_GOAL_CANCELED: &str = "goal.canceled";

/// Published to `goal.created` when a goal is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalCreated {
    pub goal_id: Uuid,
    pub user_id: String,
    pub category: GoalCategory,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl GoalCreated {
    pub fn from_goal(goal: &Goal) -> Self {
        Self {
            goal_id: goal.id,
            user_id: goal.user_id.clone(),
            category: goal.category,
            title: goal.title.clone(),
            description: goal.description.clone(),
            created_at: goal.created_at,
        }
    }
}

impl BusEvent for GoalCreated {
    fn topic(&self) -> &'static str {
        TOPIC_GOAL_CREATED
    }

    fn partition_key(&self) -> String {
        self.goal_id.to_string()
    }
}

/// Published to `goal.progress.updated` on every accepted increment.
///
/// `increment` is the effective amount applied after clamping, not the
/// requested one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgressUpdated {
    pub goal_id: Uuid,
    pub user_id: String,
    pub title: String,
    pub old_progress: u32,
    pub new_progress: u32,
    pub increment: u32,
    pub unit: String,
    pub total: u32,
    pub is_completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl GoalProgressUpdated {
    /// Build the payload from the goal as persisted plus the delta that
    /// produced it.
    pub fn from_delta(goal: &Goal, delta: &ProgressDelta) -> Self {
        Self {
            goal_id: goal.id,
            user_id: goal.user_id.clone(),
            title: goal.title.clone(),
            old_progress: delta.old_completed,
            new_progress: delta.new_completed,
            increment: delta.effective_increment,
            unit: delta.unit.clone(),
            total: delta.total,
            is_completed: delta.completed,
            updated_at: goal.updated_at,
        }
    }
}

impl BusEvent for GoalProgressUpdated {
    fn topic(&self) -> &'static str {
        TOPIC_GOAL_PROGRESS_UPDATED
    }

    fn partition_key(&self) -> String {
        self.goal_id.to_string()
    }
}

/// Published to `goal.canceled` when a goal is canceled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalCanceled {
    pub goal_id: Uuid,
    pub user_id: String,
    pub title: String,
    pub canceled_at: DateTime<Utc>,
}

impl GoalCanceled {
    pub fn from_goal(goal: &Goal) -> Self {
        Self {
            goal_id: goal.id,
            user_id: goal.user_id.clone(),
            title: goal.title.clone(),
            canceled_at: goal.updated_at,
        }
    }
}

impl BusEvent for GoalCanceled {
    fn topic(&self) -> &'static str {
        TOPIC_GOAL_CANCELED
    }

    fn partition_key(&self) -> String {
        self.goal_id.to_string()
    }
}
