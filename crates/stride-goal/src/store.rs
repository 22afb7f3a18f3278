// store.rs — Persistence collaborator for goals.
//
// Storage only: the store never applies transition logic. It does supply
// the two things the lifecycle needs from storage: writers to the same
// goal are serialized (per-goal lock), and a stale read cannot clobber a
// newer write (compare-and-swap on the version field).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::error::GoalError;
use crate::goal::{Goal, GoalCategory, GoalStatus};

/// Storage seam for the lifecycle state machine.
pub trait GoalStore: Send + Sync {
    /// Persist a brand-new goal. Fails if the id is already taken.
    fn insert(&self, goal: &Goal) -> Result<(), GoalError>;

    /// Persist an updated goal.
    ///
    /// Succeeds only while the stored version still equals `goal.version`;
    /// otherwise a concurrent writer got there first and the caller gets
    /// `VersionConflict`. The persisted copy carries `goal.version + 1`
    /// and is returned.
    fn update(&self, goal: &Goal) -> Result<Goal, GoalError>;

    /// Get a goal by id.
    fn get(&self, id: Uuid) -> Result<Option<Goal>, GoalError>;

    /// List all goals, newest first.
    fn list(&self) -> Result<Vec<Goal>, GoalError>;

    /// List goals owned by one user, newest first.
    fn list_by_user(&self, user_id: &str) -> Result<Vec<Goal>, GoalError>;

    /// List goals in one lifecycle state, newest first.
    fn list_by_status(&self, status: GoalStatus) -> Result<Vec<Goal>, GoalError>;

    /// List goals in one category, newest first.
    fn list_by_category(&self, category: GoalCategory) -> Result<Vec<Goal>, GoalError>;

    /// Remove a stored goal. Returns whether anything was deleted.
    fn delete(&self, id: Uuid) -> Result<bool, GoalError>;
}

/// File-per-goal JSON store: `<store_dir>/<goal_id>.json`.
///
/// Keeps goals isolated and easy to inspect manually. The lock map makes
/// the read-check-write in `update` atomic for in-process writers; the
/// version check catches anything else.
pub struct JsonGoalStore {
    store_dir: PathBuf,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl JsonGoalStore {
    /// Create a store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, GoalError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| GoalError::Io {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            store_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn goal_file(&self, id: Uuid) -> PathBuf {
        self.store_dir.join(format!("{}.json", id))
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id).or_default().clone()
    }

    fn read_goal(&self, path: &Path) -> Result<Goal, GoalError> {
        let json = fs::read_to_string(path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_goal(&self, goal: &Goal) -> Result<(), GoalError> {
        let path = self.goal_file(goal.id);
        let json = serde_json::to_string_pretty(goal)?;
        fs::write(&path, json).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl GoalStore for JsonGoalStore {
    fn insert(&self, goal: &Goal) -> Result<(), GoalError> {
        let lock = self.lock_for(goal.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.goal_file(goal.id).exists() {
            return Err(GoalError::InvalidGoal {
                reason: format!("goal id already exists: {}", goal.id),
            });
        }
        self.write_goal(goal)
    }

    fn update(&self, goal: &Goal) -> Result<Goal, GoalError> {
        let lock = self.lock_for(goal.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.goal_file(goal.id);
        if !path.exists() {
            return Err(GoalError::NotFound(goal.id));
        }
        let stored = self.read_goal(&path)?;
        if stored.version != goal.version {
            return Err(GoalError::VersionConflict {
                goal_id: goal.id,
                expected: goal.version,
                actual: stored.version,
            });
        }

        let mut next = goal.clone();
        next.version = goal.version + 1;
        self.write_goal(&next)?;
        Ok(next)
    }

    fn get(&self, id: Uuid) -> Result<Option<Goal>, GoalError> {
        let path = self.goal_file(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_goal(&path)?))
    }

    fn list(&self) -> Result<Vec<Goal>, GoalError> {
        let mut goals = Vec::new();

        let entries = fs::read_dir(&self.store_dir).map_err(|source| GoalError::Io {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| GoalError::Io {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                let json = fs::read_to_string(&path).map_err(|source| GoalError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                // Skip files that don't parse rather than failing the listing.
                if let Ok(goal) = serde_json::from_str::<Goal>(&json) {
                    goals.push(goal);
                }
            }
        }

        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Goal>, GoalError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|g| g.user_id == user_id)
            .collect())
    }

    fn list_by_status(&self, status: GoalStatus) -> Result<Vec<Goal>, GoalError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|g| g.status == status)
            .collect())
    }

    fn list_by_category(&self, category: GoalCategory) -> Result<Vec<Goal>, GoalError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|g| g.category == category)
            .collect())
    }

    fn delete(&self, id: Uuid) -> Result<bool, GoalError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.goal_file(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{Frequency, GoalDraft, Periodicity};
    use tempfile::tempdir;

    fn make_goal(user: &str, title: &str, category: GoalCategory) -> Goal {
        Goal::create(GoalDraft {
            user_id: user.to_string(),
            category,
            title: title.to_string(),
            description: "test goal".to_string(),
            frequency: Frequency {
                periodicity: Periodicity::Daily,
                times_per_period: 1,
            },
            total: 10,
            unit: "times".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn insert_and_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        store.insert(&goal).unwrap();

        let found = store.get(goal.id).unwrap().unwrap();
        assert_eq!(found, goal);
    }

    #[test]
    fn get_twice_without_writes_returns_equal_values() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        store.insert(&goal).unwrap();

        let a = store.get(goal.id).unwrap();
        let b = store.get(goal.id).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        store.insert(&goal).unwrap();
        assert!(matches!(
            store.insert(&goal),
            Err(GoalError::InvalidGoal { .. })
        ));
    }

    #[test]
    fn update_bumps_version() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let mut goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        store.insert(&goal).unwrap();

        goal.title = "Walk more".to_string();
        let updated = store.update(&goal).unwrap();
        assert_eq!(updated.version, 1);

        let reloaded = store.get(goal.id).unwrap().unwrap();
        assert_eq!(reloaded.title, "Walk more");
        assert_eq!(reloaded.version, 1);
    }

    #[test]
    fn stale_update_gets_version_conflict() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        store.insert(&goal).unwrap();

        // Two writers load the same version; the second write must lose.
        let mut first = store.get(goal.id).unwrap().unwrap();
        let mut second = store.get(goal.id).unwrap().unwrap();

        first.title = "First writer".to_string();
        store.update(&first).unwrap();

        second.title = "Second writer".to_string();
        let result = store.update(&second);
        assert!(matches!(result, Err(GoalError::VersionConflict { .. })));

        // The first write survived.
        let stored = store.get(goal.id).unwrap().unwrap();
        assert_eq!(stored.title, "First writer");
    }

    #[test]
    fn update_nonexistent_returns_not_found() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        let result = store.update(&goal);
        assert!(matches!(result, Err(GoalError::NotFound(_))));
    }

    #[test]
    fn list_filters() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let g1 = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        let g2 = make_goal("user-2", "Meditate", GoalCategory::MentalHealth);
        let mut g3 = make_goal("user-1", "Sleep", GoalCategory::Sleep);
        g3.status = GoalStatus::InProgress;

        store.insert(&g1).unwrap();
        store.insert(&g2).unwrap();
        store.insert(&g3).unwrap();

        assert_eq!(store.list().unwrap().len(), 3);
        assert_eq!(store.list_by_user("user-1").unwrap().len(), 2);
        assert_eq!(
            store.list_by_status(GoalStatus::InProgress).unwrap().len(),
            1
        );
        assert_eq!(
            store
                .list_by_category(GoalCategory::MentalHealth)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn delete_goal() {
        let dir = tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals")).unwrap();

        let goal = make_goal("user-1", "Walk", GoalCategory::PhysicalHealth);
        store.insert(&goal).unwrap();

        assert!(store.delete(goal.id).unwrap());
        assert!(store.get(goal.id).unwrap().is_none());
        assert!(!store.delete(goal.id).unwrap());
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("goals");

        let goal = make_goal("user-1", "Persistent", GoalCategory::Wellbeing);

        {
            let store = JsonGoalStore::new(&store_path).unwrap();
            store.insert(&goal).unwrap();
        }

        {
            let store = JsonGoalStore::new(&store_path).unwrap();
            let found = store.get(goal.id).unwrap().unwrap();
            assert_eq!(found.title, "Persistent");
        }
    }
}
