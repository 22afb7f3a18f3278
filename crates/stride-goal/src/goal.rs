// goal.rs — Goal: the aggregate tracking a user's pursued health objective.
//
// The state machine enforces a valid lifecycle:
//   Active → InProgress → Completed
//   Active → Canceled; InProgress → Canceled
// Completed and Canceled are terminal: nothing mutates a terminal goal.
// A single increment may also finish a fresh goal (Active → Completed).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;

/// Health category a goal belongs to.
///
/// A closed set, serialized in its wire form. Unknown strings are rejected
/// at the serde boundary instead of being passed through to consumers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalCategory {
    PhysicalHealth,
    MentalHealth,
    Nutrition,
    Sleep,
    Wellbeing,
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalCategory::PhysicalHealth => write!(f, "physical_health"),
            GoalCategory::MentalHealth => write!(f, "mental_health"),
            GoalCategory::Nutrition => write!(f, "nutrition"),
            GoalCategory::Sleep => write!(f, "sleep"),
            GoalCategory::Wellbeing => write!(f, "wellbeing"),
        }
    }
}

impl FromStr for GoalCategory {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "physical_health" => Ok(GoalCategory::PhysicalHealth),
            "mental_health" => Ok(GoalCategory::MentalHealth),
            "nutrition" => Ok(GoalCategory::Nutrition),
            "sleep" => Ok(GoalCategory::Sleep),
            "wellbeing" => Ok(GoalCategory::Wellbeing),
            other => Err(GoalError::InvalidGoal {
                reason: format!("unknown category: {}", other),
            }),
        }
    }
}

/// The lifecycle state of a goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    /// Created, no progress recorded yet.
    Active,

    /// At least some progress has been recorded.
    InProgress,

    /// Progress reached the target. Terminal.
    Completed,

    /// Abandoned by its owner. Terminal.
    Canceled,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Active => write!(f, "active"),
            GoalStatus::InProgress => write!(f, "in_progress"),
            GoalStatus::Completed => write!(f, "completed"),
            GoalStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for GoalStatus {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "in_progress" => Ok(GoalStatus::InProgress),
            "completed" => Ok(GoalStatus::Completed),
            "canceled" => Ok(GoalStatus::Canceled),
            other => Err(GoalError::InvalidGoal {
                reason: format!("unknown status: {}", other),
            }),
        }
    }
}

impl GoalStatus {
    /// Whether this state admits no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::Canceled)
    }

    /// Check whether transitioning from this state to `next` is valid.
    ///
    /// The valid transitions form a DAG with terminal states Completed
    /// and Canceled:
    ///   Active → InProgress → Completed
    ///   Active → Completed (a single increment can finish a fresh goal)
    ///   Active → Canceled; InProgress → Canceled
    pub fn can_transition_to(&self, next: &GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Active, GoalStatus::InProgress)
                | (GoalStatus::Active, GoalStatus::Completed)
                | (GoalStatus::Active, GoalStatus::Canceled)
                | (GoalStatus::InProgress, GoalStatus::Completed)
                | (GoalStatus::InProgress, GoalStatus::Canceled)
        )
    }
}

/// How often the goal is pursued within its period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Periodicity::Daily => write!(f, "daily"),
            Periodicity::Weekly => write!(f, "weekly"),
            Periodicity::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Periodicity {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            "monthly" => Ok(Periodicity::Monthly),
            other => Err(GoalError::InvalidGoal {
                reason: format!("unknown periodicity: {}", other),
            }),
        }
    }
}

/// Target cadence: `times_per_period` repetitions per `periodicity`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frequency {
    pub periodicity: Periodicity,
    pub times_per_period: u32,
}

/// Advancement toward the goal's target.
///
/// Invariant: `completed <= total` always; `completed == total` exactly
/// when the goal is Completed (progress is capped, never overshoots).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
    pub unit: String,
}

/// A user's health goal — the aggregate root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    /// Unique identifier, assigned on creation. Immutable.
    pub id: Uuid,

    /// Owner identifier. Immutable after creation.
    pub user_id: String,

    /// Health category. Immutable after creation.
    pub category: GoalCategory,

    /// Short human-readable title (e.g., "7h sleep").
    pub title: String,

    /// What the user is trying to achieve.
    pub description: String,

    /// Target cadence.
    pub frequency: Frequency,

    /// Advancement toward the target.
    pub progress: Progress,

    /// Current lifecycle state.
    pub status: GoalStatus,

    /// Date the goal was started.
    pub start_date: NaiveDate,

    /// When this goal was created.
    pub created_at: DateTime<Utc>,

    /// When this goal was last updated.
    pub updated_at: DateTime<Utc>,

    /// Bumped by the store on every successful write. Backs the
    /// optimistic concurrency check; a stale writer gets VersionConflict.
    #[serde(default)]
    pub version: u64,
}

/// Input for creating a goal. Validated by [`Goal::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalDraft {
    pub user_id: String,
    pub category: GoalCategory,
    pub title: String,
    pub description: String,
    pub frequency: Frequency,
    pub total: u32,
    pub unit: String,
}

/// Field patch for the update-goal command.
///
/// Status, owner, and category move only through dedicated operations and
/// deliberately have no fields here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub unit: Option<String>,
}

impl Goal {
    /// Validate a draft and mint a new Active goal with zero progress.
    pub fn create(draft: GoalDraft) -> Result<Self, GoalError> {
        if draft.title.trim().is_empty() {
            return Err(GoalError::InvalidGoal {
                reason: "title must not be blank".to_string(),
            });
        }
        if draft.description.trim().is_empty() {
            return Err(GoalError::InvalidGoal {
                reason: "description must not be blank".to_string(),
            });
        }
        if draft.frequency.times_per_period == 0 {
            return Err(GoalError::InvalidGoal {
                reason: "frequency.times_per_period must be positive".to_string(),
            });
        }
        if draft.total == 0 {
            return Err(GoalError::InvalidGoal {
                reason: "progress.total must be positive".to_string(),
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            category: draft.category,
            title: draft.title,
            description: draft.description,
            frequency: draft.frequency,
            progress: Progress {
                completed: 0,
                total: draft.total,
                unit: draft.unit,
            },
            status: GoalStatus::Active,
            start_date: now.date_naive(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Whether this goal is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fraction of the target reached, clamped to [0, 1].
    pub fn percent_complete(&self) -> f64 {
        if self.progress.total == 0 {
            return 0.0;
        }
        (f64::from(self.progress.completed) / f64::from(self.progress.total)).clamp(0.0, 1.0)
    }

    /// Error for any mutating command against a terminal goal.
    pub fn guard_not_terminal(&self) -> Result<(), GoalError> {
        match self.status {
            GoalStatus::Completed => Err(GoalError::AlreadyCompleted(self.id)),
            GoalStatus::Canceled => Err(GoalError::AlreadyCanceled(self.id)),
            _ => Ok(()),
        }
    }

    /// Move to `next`, enforcing the status DAG.
    pub fn transition(&mut self, next: GoalStatus) -> Result<(), GoalError> {
        if !self.status.can_transition_to(&next) {
            return Err(match self.status {
                GoalStatus::Completed => GoalError::AlreadyCompleted(self.id),
                GoalStatus::Canceled => GoalError::AlreadyCanceled(self.id),
                GoalStatus::InProgress if next == GoalStatus::InProgress => {
                    GoalError::AlreadyInProgress(self.id)
                }
                from => GoalError::InvalidGoal {
                    reason: format!("invalid status transition: {} -> {}", from, next),
                },
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a non-status field patch and re-check entity invariants.
    pub fn apply_patch(&mut self, patch: GoalPatch) -> Result<(), GoalError> {
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(GoalError::InvalidGoal {
                    reason: "title must not be blank".to_string(),
                });
            }
            self.title = title;
        }
        if let Some(description) = patch.description {
            if description.trim().is_empty() {
                return Err(GoalError::InvalidGoal {
                    reason: "description must not be blank".to_string(),
                });
            }
            self.description = description;
        }
        if let Some(frequency) = patch.frequency {
            if frequency.times_per_period == 0 {
                return Err(GoalError::InvalidGoal {
                    reason: "frequency.times_per_period must be positive".to_string(),
                });
            }
            self.frequency = frequency;
        }
        if let Some(unit) = patch.unit {
            self.progress.unit = unit;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
