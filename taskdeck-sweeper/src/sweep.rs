/// One pass of the trash sweep
///
/// Permanently deletes projects and tasks whose `deleted_at` is older than
/// the retention window. Order matters only for referential integrity: tasks
/// belonging to expired projects go first so the project rows can be deleted
/// without foreign-key violations, then any remaining individually-trashed
/// tasks are purged.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use taskdeck_shared::lifecycle::purge_cutoff;
use taskdeck_shared::models::{project::Project, task::Task};

/// What one sweep pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Projects permanently deleted
    pub projects_purged: u64,

    /// Tasks permanently deleted (both cascaded and individually trashed)
    pub tasks_purged: u64,
}

impl SweepOutcome {
    /// Whether the pass removed anything at all
    pub fn is_empty(&self) -> bool {
        self.projects_purged == 0 && self.tasks_purged == 0
    }
}

/// Runs one sweep pass against the retention cutoff derived from `now`
///
/// Tasks inside expired projects are purged regardless of their own
/// `deleted_at`; a project leaving existence takes its board with it.
pub async fn sweep_trash(pool: &PgPool, now: DateTime<Utc>) -> Result<SweepOutcome, sqlx::Error> {
    let cutoff = purge_cutoff(now);

    let expired_projects = Project::find_expired_trashed(pool, cutoff).await?;

    let cascaded_tasks = Task::purge_by_projects(pool, &expired_projects).await?;
    let projects_purged = Project::purge_expired(pool, cutoff).await?;
    let expired_tasks = Task::purge_expired(pool, cutoff).await?;

    let outcome = SweepOutcome {
        projects_purged,
        tasks_purged: cascaded_tasks + expired_tasks,
    };

    if !outcome.is_empty() {
        tracing::info!(
            projects_purged = outcome.projects_purged,
            tasks_purged = outcome.tasks_purged,
            "Trash sweep removed expired items"
        );
    } else {
        tracing::debug!("Trash sweep found nothing to remove");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_empty() {
        assert!(SweepOutcome::default().is_empty());
        assert!(!SweepOutcome {
            projects_purged: 1,
            tasks_purged: 0
        }
        .is_empty());
        assert!(!SweepOutcome {
            projects_purged: 0,
            tasks_purged: 3
        }
        .is_empty());
    }

    // Sweeps against real data are covered by integration tests that
    // require a running database.
}
