/// Task model and database operations
///
/// Tasks live on a project's board, organized by status column and sorted by
/// a stable manual order. They carry subtasks and comments inline and share
/// the project's soft-delete lifecycle fields.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'active', 'testing', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     project UUID NOT NULL REFERENCES projects(id),
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     sort_order INTEGER NOT NULL DEFAULT 0,
///     subtasks JSONB NOT NULL DEFAULT '[]',
///     comments JSONB NOT NULL DEFAULT '[]',
///     deleted_at TIMESTAMPTZ,
///     archived BOOLEAN NOT NULL DEFAULT FALSE,
///     archived_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `sort_order` is assigned as the number of tasks the project has at
/// creation time and is never renumbered on deletion; gaps are expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::lifecycle::{classify, LifecycleState, LifecycleView};

const TASK_COLUMNS: &str = "id, title, description, status, priority, project, assigned_to, \
                            sort_order, subtasks, comments, deleted_at, archived, archived_at, \
                            created_at, updated_at";

/// Board column a task sits in
///
/// Declared in board order; the derived `Ord` follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,

    /// In progress
    Active,

    /// Awaiting verification
    Testing,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Status as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Active => "active",
            TaskStatus::Testing => "testing",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority, used as a secondary sort key on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low urgency
    Low,

    /// Default
    #[default]
    Medium,

    /// Needs attention soon
    High,

    /// Drop everything
    Urgent,
}

impl TaskPriority {
    /// Priority as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// A checklist item inside a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// Subtask title
    pub title: String,

    /// Whether the item is done
    #[serde(default)]
    pub completed: bool,
}

/// A comment on a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Comment author; null when the author's account was deleted
    pub user: Option<Uuid>,

    /// Comment body
    pub text: String,

    /// When the comment was written
    pub created_at: DateTime<Utc>,
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task id
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Task description (required non-empty)
    pub description: String,

    /// Board column
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Owning project
    pub project: Uuid,

    /// Assignee, if any
    pub assigned_to: Option<Uuid>,

    /// Stable manual position within the project; gaps allowed
    pub sort_order: i32,

    /// Inline checklist
    pub subtasks: Json<Vec<Subtask>>,

    /// Inline comment thread
    pub comments: Json<Vec<Comment>>,

    /// When the task was moved to trash (null = not trashed)
    pub deleted_at: Option<DateTime<Utc>>,

    /// Archived flag; irrelevant while trashed
    pub archived: bool,

    /// When the task was archived
    pub archived_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title (non-empty)
    pub title: String,

    /// Description (non-empty)
    pub description: String,

    /// Board column (defaults to todo)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Owning project
    pub project: Uuid,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// Initial checklist
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Input for updating task fields
///
/// `None` leaves a field unchanged; `assigned_to` is doubly optional so an
/// explicit JSON `null` unassigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New board column
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee; `Some(None)` unassigns
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    /// New manual position
    pub sort_order: Option<i32>,

    /// Replacement checklist
    pub subtasks: Option<Vec<Subtask>>,
}

impl Task {
    /// Observable lifecycle state from the entity's own fields
    pub fn lifecycle_state(&self) -> LifecycleState {
        classify(self.deleted_at, self.archived)
    }

    /// Creates a new task at the end of the project's board
    ///
    /// `sort_order` is the project's current task count; earlier deletions
    /// leave gaps and are never compacted.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE project = $1")
            .bind(data.project)
            .fetch_one(pool)
            .await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, project,
                               assigned_to, sort_order, subtasks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.project)
        .bind(data.assigned_to)
        .bind(count as i32)
        .bind(Json(data.subtasks))
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by id, whatever its lifecycle state
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks in one lifecycle view, board order
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        view: LifecycleView,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project = $1 AND {} \
             ORDER BY sort_order ASC, created_at ASC",
            view.sql_predicate(),
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Applies a partial update to task fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sort_order = ${}", bind_count));
        }
        if data.subtasks.is_some() {
            bind_count += 1;
            query.push_str(&format!(", subtasks = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }
        if let Some(subtasks) = data.subtasks {
            q = q.bind(Json(subtasks));
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Appends a comment to the task's thread
    pub async fn add_comment(
        pool: &PgPool,
        id: Uuid,
        comment: Comment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET comments = comments || $2::jsonb, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(Json(comment))
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// active|archived → archived
    pub async fn archive(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET archived = TRUE, archived_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// archived → active
    pub async fn unarchive(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET archived = FALSE, archived_at = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// active|archived → trashed
    pub async fn trash(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// trashed → active; never resurrects the archived flag
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET deleted_at = NULL, archived = FALSE, archived_at = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NOT NULL
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Irreversibly removes a single trashed task
    ///
    /// A task that is not in the trash is left untouched and `false` is
    /// returned.
    pub async fn purge(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND deleted_at IS NOT NULL")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every task belonging to the given projects, regardless of the
    /// tasks' own lifecycle state. Used by the project purge cascade.
    pub async fn purge_by_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM tasks WHERE project = ANY($1)")
            .bind(project_ids)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes all trashed tasks older than the cutoff, returning how many
    pub async fn purge_expired(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM tasks WHERE deleted_at IS NOT NULL AND deleted_at < $1")
                .bind(cutoff)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_board_order() {
        assert!(TaskStatus::Todo < TaskStatus::Active);
        assert!(TaskStatus::Active < TaskStatus::Testing);
        assert!(TaskStatus::Testing < TaskStatus::Done);
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }

    #[test]
    fn test_priority_order() {
        assert!(TaskPriority::Low < TaskPriority::Medium);
        assert!(TaskPriority::Medium < TaskPriority::High);
        assert!(TaskPriority::High < TaskPriority::Urgent);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Testing).unwrap(),
            "\"testing\""
        );
        let parsed: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
        assert!(serde_json::from_str::<TaskStatus>("\"blocked\"").is_err());
    }

    #[test]
    fn test_priority_as_str_matches_serde() {
        for priority in [
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Urgent,
        ] {
            let json = serde_json::to_string(&priority).unwrap();
            assert_eq!(json, format!("\"{}\"", priority.as_str()));
        }
    }

    #[test]
    fn test_subtask_completed_defaults_false() {
        let subtask: Subtask = serde_json::from_str(r#"{"title": "write docs"}"#).unwrap();
        assert!(!subtask.completed);
    }
}
