// service.rs — The goal lifecycle state machine.
//
// Sole writer over the store. Every command is load → validate/compute →
// persist → publish. Publishing is fire-and-forget past serialization: a
// persisted mutation is never rolled back because its event failed to
// reach the broker, so the event stream is an at-least-once companion to
// stored state, not an exact mirror.

use std::sync::Arc;

use uuid::Uuid;

use stride_events::EventPublisher;

use crate::error::GoalError;
use crate::events::{GoalCanceled, GoalCreated, GoalProgressUpdated};
use crate::goal::{Goal, GoalCategory, GoalDraft, GoalPatch, GoalStatus};
use crate::progress::{apply_increment, ProgressDelta};
use crate::store::GoalStore;

/// Drives all goal lifecycle transitions and hands accepted ones to the
/// event pipeline.
pub struct GoalService {
    store: Arc<dyn GoalStore>,
    publisher: EventPublisher,
}

impl GoalService {
    pub fn new(store: Arc<dyn GoalStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// Create a goal from a validated draft and announce it.
    pub fn create(&self, draft: GoalDraft) -> Result<Goal, GoalError> {
        let goal = Goal::create(draft)?;
        self.store.insert(&goal)?;
        tracing::info!(goal_id = %goal.id, user_id = %goal.user_id, title = %goal.title, "goal created");
        self.publisher.publish(&GoalCreated::from_goal(&goal))?;
        Ok(goal)
    }

    /// Get a goal by id.
    pub fn find(&self, id: Uuid) -> Result<Option<Goal>, GoalError> {
        self.store.get(id)
    }

    /// List all goals, newest first.
    pub fn list(&self) -> Result<Vec<Goal>, GoalError> {
        self.store.list()
    }

    /// List goals owned by one user.
    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Goal>, GoalError> {
        self.store.list_by_user(user_id)
    }

    /// List goals in one lifecycle state.
    pub fn list_by_status(&self, status: GoalStatus) -> Result<Vec<Goal>, GoalError> {
        self.store.list_by_status(status)
    }

    /// List goals in one category.
    pub fn list_by_category(&self, category: GoalCategory) -> Result<Vec<Goal>, GoalError> {
        self.store.list_by_category(category)
    }

    /// Patch non-status fields of a goal.
    ///
    /// Status, owner, and category move only through dedicated operations;
    /// terminal goals reject the patch with the matching already-* error.
    pub fn update(&self, id: Uuid, patch: GoalPatch) -> Result<Goal, GoalError> {
        let mut goal = self.load(id)?;
        goal.guard_not_terminal()?;
        goal.apply_patch(patch)?;
        self.store.update(&goal)
    }

    /// Explicitly move an Active goal to InProgress.
    ///
    /// Redundant starts are rejected with `AlreadyInProgress` rather than
    /// silently succeeding — double submissions surface in the caller.
    pub fn start(&self, id: Uuid) -> Result<Goal, GoalError> {
        let mut goal = self.load(id)?;
        goal.transition(GoalStatus::InProgress)?;
        self.store.update(&goal)
    }

    /// Apply a progress increment and announce the result.
    ///
    /// The delta returned is the same one the event was built from.
    pub fn advance_progress(
        &self,
        id: Uuid,
        increment: i64,
    ) -> Result<(Goal, ProgressDelta), GoalError> {
        let goal = self.load(id)?;
        let (next, delta) = apply_increment(&goal, increment)?;
        let next = self.store.update(&next)?;

        tracing::info!(
            goal_id = %id,
            from = delta.old_completed,
            to = delta.new_completed,
            completed = delta.completed,
            "progress advanced"
        );
        self.publisher
            .publish(&GoalProgressUpdated::from_delta(&next, &delta))?;
        Ok((next, delta))
    }

    /// Cancel a goal (soft delete) and announce it.
    pub fn cancel(&self, id: Uuid) -> Result<Goal, GoalError> {
        let mut goal = self.load(id)?;
        goal.transition(GoalStatus::Canceled)?;
        let goal = self.store.update(&goal)?;

        tracing::info!(goal_id = %id, "goal canceled");
        self.publisher.publish(&GoalCanceled::from_goal(&goal))?;
        Ok(goal)
    }

    /// Hard-delete a stored goal.
    pub fn delete(&self, id: Uuid) -> Result<(), GoalError> {
        if !self.store.delete(id)? {
            return Err(GoalError::NotFound(id));
        }
        tracing::info!(goal_id = %id, "goal deleted");
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Goal, GoalError> {
        self.store.get(id)?.ok_or(GoalError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{Frequency, Periodicity};
    use crate::store::JsonGoalStore;
    use stride_events::MemoryTransport;
    use tempfile::tempdir;

    struct Fixture {
        service: GoalService,
        transport: Arc<MemoryTransport>,
        publisher: EventPublisher,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let store = Arc::new(JsonGoalStore::new(dir.path().join("goals")).unwrap());
        let transport = Arc::new(MemoryTransport::new(4));
        let publisher = EventPublisher::new(transport.clone());
        Fixture {
            service: GoalService::new(store, publisher.clone()),
            transport,
            publisher,
            _dir: dir,
        }
    }

    fn draft(user: &str, title: &str) -> GoalDraft {
        GoalDraft {
            user_id: user.to_string(),
            category: GoalCategory::Sleep,
            title: title.to_string(),
            description: "Sleep seven hours a night".to_string(),
            frequency: Frequency {
                periodicity: Periodicity::Daily,
                times_per_period: 1,
            },
            total: 7,
            unit: "nights".to_string(),
        }
    }

    #[tokio::test]
    async fn create_persists_and_emits_goal_created() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();

        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(fx.service.find(goal.id).unwrap().unwrap(), goal);

        fx.publisher.shutdown().await;
        let sent = fx.transport.sent_to("goal.created");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].key, goal.id.to_string());
    }

    #[tokio::test]
    async fn invalid_draft_persists_nothing_and_emits_nothing() {
        let fx = fixture();
        let mut d = draft("user-1", "x");
        d.title = String::new();

        assert!(matches!(
            fx.service.create(d),
            Err(GoalError::InvalidGoal { .. })
        ));
        assert!(fx.service.list().unwrap().is_empty());

        fx.publisher.shutdown().await;
        assert!(fx.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn advance_progress_emits_delta_event() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();

        let (next, delta) = fx.service.advance_progress(goal.id, 3).unwrap();
        assert_eq!(next.progress.completed, 3);
        assert_eq!(next.status, GoalStatus::InProgress);
        assert_eq!(delta.effective_increment, 3);

        fx.publisher.shutdown().await;
        let sent = fx.transport.sent_to("goal.progress.updated");
        assert_eq!(sent.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&sent[0].payload).unwrap();
        assert_eq!(payload["oldProgress"], 0);
        assert_eq!(payload["newProgress"], 3);
        assert_eq!(payload["increment"], 3);
        assert_eq!(payload["isCompleted"], false);
    }

    #[tokio::test]
    async fn update_patches_fields_but_not_status() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();

        let updated = fx
            .service
            .update(
                goal.id,
                GoalPatch {
                    title: Some("8h sleep".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "8h sleep");
        assert_eq!(updated.status, GoalStatus::Active);
        assert_eq!(updated.user_id, goal.user_id);
        assert_eq!(updated.category, goal.category);

        fx.publisher.shutdown().await;
    }

    #[tokio::test]
    async fn update_on_terminal_goal_fails_without_mutation() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();
        fx.service.cancel(goal.id).unwrap();

        let result = fx.service.update(
            goal.id,
            GoalPatch {
                title: Some("changed".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(GoalError::AlreadyCanceled(_))));
        assert_eq!(fx.service.find(goal.id).unwrap().unwrap().title, "7h sleep");

        fx.publisher.shutdown().await;
    }

    #[tokio::test]
    async fn start_moves_active_to_in_progress_once() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();

        let started = fx.service.start(goal.id).unwrap();
        assert_eq!(started.status, GoalStatus::InProgress);

        let again = fx.service.start(goal.id);
        assert!(matches!(again, Err(GoalError::AlreadyInProgress(_))));

        fx.publisher.shutdown().await;
    }

    #[tokio::test]
    async fn cancel_succeeds_once_then_reports_already_canceled() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();

        let canceled = fx.service.cancel(goal.id).unwrap();
        assert_eq!(canceled.status, GoalStatus::Canceled);

        let again = fx.service.cancel(goal.id);
        assert!(matches!(again, Err(GoalError::AlreadyCanceled(_))));

        fx.publisher.shutdown().await;
        assert_eq!(fx.transport.sent_to("goal.canceled").len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_goal() {
        let fx = fixture();
        let goal = fx.service.create(draft("user-1", "7h sleep")).unwrap();

        fx.service.delete(goal.id).unwrap();
        assert!(fx.service.find(goal.id).unwrap().is_none());
        assert!(matches!(
            fx.service.delete(goal.id),
            Err(GoalError::NotFound(_))
        ));

        fx.publisher.shutdown().await;
    }

    #[tokio::test]
    async fn operations_on_missing_goal_fail_not_found() {
        let fx = fixture();
        let id = Uuid::new_v4();

        assert!(matches!(
            fx.service.advance_progress(id, 1),
            Err(GoalError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.cancel(id),
            Err(GoalError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.update(id, GoalPatch::default()),
            Err(GoalError::NotFound(_))
        ));

        fx.publisher.shutdown().await;
    }

    #[tokio::test]
    async fn list_filters_by_user_status_category() {
        let fx = fixture();
        let g1 = fx.service.create(draft("user-1", "Sleep A")).unwrap();
        let _g2 = fx.service.create(draft("user-2", "Sleep B")).unwrap();
        fx.service.advance_progress(g1.id, 1).unwrap();

        assert_eq!(fx.service.list().unwrap().len(), 2);
        assert_eq!(fx.service.list_by_user("user-1").unwrap().len(), 1);
        assert_eq!(
            fx.service
                .list_by_status(GoalStatus::InProgress)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            fx.service
                .list_by_category(GoalCategory::Sleep)
                .unwrap()
                .len(),
            2
        );

        fx.publisher.shutdown().await;
    }
}
