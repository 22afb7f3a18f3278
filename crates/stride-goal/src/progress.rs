// progress.rs — The progress update algorithm.
//
// A pure function: computes the next goal state and the event-facing delta
// from the current state plus an increment. Both the persisted state and
// the emitted event come from this one computation, so what is stored and
// what is announced cannot drift apart.

use chrono::Utc;

use crate::error::GoalError;
use crate::goal::{Goal, GoalStatus};

/// What one progress update changed. Carries everything the progress
/// event needs verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressDelta {
    pub old_completed: u32,
    pub new_completed: u32,
    /// Amount actually applied after clamping to `total` — may be less
    /// than the requested increment.
    pub effective_increment: u32,
    pub total: u32,
    pub unit: String,
    /// Whether this update reached the target.
    pub completed: bool,
}

/// Apply a progress increment to a goal.
///
/// Fails on terminal goals and non-positive increments; a failed call
/// leaves the input untouched. Progress never exceeds `total`: excess is
/// clamped silently and the delta records the effective increment.
/// Reaching `total` completes the goal; otherwise the first increment on
/// a fresh goal moves it from Active to InProgress.
pub fn apply_increment(goal: &Goal, increment: i64) -> Result<(Goal, ProgressDelta), GoalError> {
    goal.guard_not_terminal()?;
    if increment <= 0 {
        return Err(GoalError::InvalidIncrement(increment));
    }

    let old_completed = goal.progress.completed;
    let total = goal.progress.total;
    let requested = u64::from(old_completed).saturating_add(increment as u64);
    let new_completed = requested.min(u64::from(total)) as u32;
    let completed = new_completed == total;

    let mut next = goal.clone();
    next.progress.completed = new_completed;
    next.status = if completed {
        GoalStatus::Completed
    } else if goal.status == GoalStatus::Active {
        GoalStatus::InProgress
    } else {
        goal.status
    };
    next.updated_at = Utc::now();

    let delta = ProgressDelta {
        old_completed,
        new_completed,
        effective_increment: new_completed - old_completed,
        total,
        unit: goal.progress.unit.clone(),
        completed,
    };
    Ok((next, delta))
}
