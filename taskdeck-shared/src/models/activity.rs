/// Activity log model
///
/// An append-only, immutable record of what happened in a project. The log
/// is strictly best-effort: [`Activity::record`] swallows every failure so a
/// broken log can never fail or roll back the primary operation it trails.
/// Callers apply the primary mutation first, then record.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activities (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     "user" UUID REFERENCES users(id) ON DELETE SET NULL,
///     action VARCHAR(50) NOT NULL,
///     entity_type VARCHAR(20) NOT NULL DEFAULT 'task',
///     entity_id UUID,
///     entity_title VARCHAR(255),
///     details TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE INDEX idx_activities_project_created
///     ON activities (project, created_at DESC);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// How many entries a project feed returns
pub const ACTIVITY_FEED_LIMIT: i64 = 100;

/// Action tag recorded with each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityAction {
    /// A project was created
    #[serde(rename = "project.created")]
    ProjectCreated,

    /// Project metadata changed (includes archive/restore toggles)
    #[serde(rename = "project.updated")]
    ProjectUpdated,

    /// A project was moved to trash
    #[serde(rename = "project.deleted")]
    ProjectDeleted,

    /// A task was created
    #[serde(rename = "task.created")]
    TaskCreated,

    /// Task fields changed
    #[serde(rename = "task.updated")]
    TaskUpdated,

    /// A task was moved to trash or purged
    #[serde(rename = "task.deleted")]
    TaskDeleted,

    /// A comment was added to a task
    #[serde(rename = "task.commented")]
    TaskCommented,

    /// A task was archived
    #[serde(rename = "task.archived")]
    TaskArchived,

    /// A task came back from the archive or the trash
    #[serde(rename = "task.restored")]
    TaskRestored,
}

impl ActivityAction {
    /// Action tag as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::ProjectCreated => "project.created",
            ActivityAction::ProjectUpdated => "project.updated",
            ActivityAction::ProjectDeleted => "project.deleted",
            ActivityAction::TaskCreated => "task.created",
            ActivityAction::TaskUpdated => "task.updated",
            ActivityAction::TaskDeleted => "task.deleted",
            ActivityAction::TaskCommented => "task.commented",
            ActivityAction::TaskArchived => "task.archived",
            ActivityAction::TaskRestored => "task.restored",
        }
    }
}

/// Which kind of entity an entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityEntityType {
    /// The project itself
    Project,

    /// A task in the project
    Task,
}

impl ActivityEntityType {
    /// Entity type as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityEntityType::Project => "project",
            ActivityEntityType::Task => "task",
        }
    }
}

/// One activity log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    /// Unique entry id
    pub id: Uuid,

    /// Project the event happened in
    pub project: Uuid,

    /// Acting user; null for system-initiated events or deleted accounts
    pub user: Option<Uuid>,

    /// Action tag (see [`ActivityAction`])
    pub action: String,

    /// Entity kind the entry is about
    pub entity_type: String,

    /// The entity's id, when it still had one at record time
    pub entity_id: Option<Uuid>,

    /// Title snapshot, since the entity may be renamed or purged later
    pub entity_title: Option<String>,

    /// Free-text detail
    pub details: Option<String>,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for recording one entry
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// Project the event happened in
    pub project: Uuid,

    /// Acting user, if any
    pub user: Option<Uuid>,

    /// Action tag
    pub action: ActivityAction,

    /// Entity kind
    pub entity_type: ActivityEntityType,

    /// Entity id snapshot
    pub entity_id: Option<Uuid>,

    /// Entity title snapshot
    pub entity_title: Option<String>,

    /// Free-text detail
    pub details: Option<String>,
}

impl Activity {
    /// Records an entry, best-effort
    ///
    /// Never returns an error: failures are logged for operators and
    /// otherwise dropped, so the primary operation that already committed is
    /// unaffected.
    pub async fn record(pool: &PgPool, entry: NewActivity) {
        if let Err(err) = Self::insert(pool, entry).await {
            tracing::warn!("activity log write failed: {}", err);
        }
    }

    async fn insert(pool: &PgPool, entry: NewActivity) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activities (project, "user", action, entity_type,
                                    entity_id, entity_title, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.project)
        .bind(entry.user)
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(entry.entity_title)
        .bind(entry.details)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Latest entries for a project, newest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, project, "user", action, entity_type, entity_id,
                   entity_title, details, created_at
            FROM activities
            WHERE project = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(ACTIVITY_FEED_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tags() {
        assert_eq!(ActivityAction::ProjectCreated.as_str(), "project.created");
        assert_eq!(ActivityAction::TaskCommented.as_str(), "task.commented");
        assert_eq!(ActivityAction::TaskRestored.as_str(), "task.restored");
    }

    #[test]
    fn test_action_serde_matches_as_str() {
        for action in [
            ActivityAction::ProjectCreated,
            ActivityAction::ProjectUpdated,
            ActivityAction::ProjectDeleted,
            ActivityAction::TaskCreated,
            ActivityAction::TaskUpdated,
            ActivityAction::TaskDeleted,
            ActivityAction::TaskCommented,
            ActivityAction::TaskArchived,
            ActivityAction::TaskRestored,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }

    #[test]
    fn test_entity_type_as_str() {
        assert_eq!(ActivityEntityType::Project.as_str(), "project");
        assert_eq!(ActivityEntityType::Task.as_str(), "task");
    }
}
