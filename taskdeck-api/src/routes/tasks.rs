/// Task endpoints
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task on a project board
/// - `GET    /v1/tasks/project/:project_id?view=…` - List a project's tasks
/// - `GET    /v1/tasks/:id` - Fetch one task
/// - `PUT    /v1/tasks/:id` - Update task fields
/// - `POST   /v1/tasks/:id/comments` - Append a comment
/// - `POST   /v1/tasks/:id/archive` / `/unarchive` / `/restore` - Lifecycle
/// - `DELETE /v1/tasks/:id` - Move to trash
/// - `DELETE /v1/tasks/:id/permanent` - Permanently delete
///
/// Task permissions derive entirely from the parent project: any role may
/// read, owners and editors may mutate, viewers are strictly read-only.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::projects::{require_trashed, ListQuery},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::{
        activity::{Activity, ActivityAction, ActivityEntityType, NewActivity},
        project::Project,
        task::{Comment, CreateTask, Subtask, Task, TaskPriority, TaskStatus, UpdateTask},
    },
    roles,
};
use uuid::Uuid;
use validator::Validate;

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Description (required non-empty)
    #[validate(length(min = 1, message = "Description is required"))]
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

/// Update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New description
    #[validate(length(min = 1, message = "Description must be non-empty"))]
    pub description: Option<String>,

    /// New board column
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee; explicit null unassigns
    #[serde(default, deserialize_with = "taskdeck_shared::models::double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    /// New manual position
    pub sort_order: Option<i32>,

    /// Replacement checklist
    pub subtasks: Option<Vec<Subtask>>,
}

/// Comment request
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    /// Comment body
    #[validate(length(min = 1, message = "Comment text is required"))]
    pub text: String,
}

/// Loads a task plus its parent project when the caller may see it, or 404
async fn load_accessible(
    state: &AppState,
    id: Uuid,
    user_id: Option<Uuid>,
) -> Result<(Task, Project), ApiError> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let project = Project::find_by_id(&state.db, task.project)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let public_read = user_id.is_none() && state.public_projects();
    if !roles::has_project_access(&project, user_id) && !public_read {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok((task, project))
}

/// Requires mutation rights on the parent project
fn require_edit(project: &Project, user_id: Uuid, denial: &str) -> Result<(), ApiError> {
    if roles::can_edit_tasks(project, Some(user_id)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(denial.to_string()))
    }
}

/// Create a task
///
/// `sort_order` is assigned from the project's current task count; viewers
/// cannot create tasks.
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    payload.validate()?;

    let project = Project::find_by_id(&state.db, payload.project)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !roles::has_project_access(&project, Some(auth.user_id)) {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    if !roles::can_edit_tasks(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden("Viewers cannot create tasks".to_string()));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: payload.title,
            description: payload.description,
            status: payload.status,
            priority: payload.priority,
            project: payload.project,
            assigned_to: payload.assigned_to,
            subtasks: payload.subtasks,
        },
    )
    .await?;

    record_task_activity(&state, &task, auth.user_id, ActivityAction::TaskCreated, None).await;

    Ok(Json(task))
}

/// List a project's tasks in one lifecycle view
///
/// Ordered by `sort_order`, then creation time.
pub async fn list_project_tasks(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let view = query.view()?;
    let user_id = auth.map(|a| a.user_id);

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let public_read = user_id.is_none() && state.public_projects();
    if !roles::has_project_access(&project, user_id) && !public_read {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let tasks = Task::list_by_project(&state.db, project_id, view).await?;

    Ok(Json(tasks))
}

/// Fetch one task
pub async fn get_task(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let (task, _project) = load_accessible(&state, id, auth.map(|a| a.user_id)).await?;
    Ok(Json(task))
}

/// Update task fields
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    payload.validate()?;

    let (_task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot edit tasks")?;

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: payload.title,
            description: payload.description,
            status: payload.status,
            priority: payload.priority,
            assigned_to: payload.assigned_to,
            sort_order: payload.sort_order,
            subtasks: payload.subtasks,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    record_task_activity(&state, &updated, auth.user_id, ActivityAction::TaskUpdated, None).await;

    Ok(Json(updated))
}

/// Append a comment to a task
///
/// The comment author is always the acting user.
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCommentRequest>,
) -> ApiResult<Json<Task>> {
    payload.validate()?;

    let (_task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot comment on tasks")?;

    let comment = Comment {
        user: Some(auth.user_id),
        text: payload.text,
        created_at: Utc::now(),
    };

    let updated = Task::add_comment(&state.db, id, comment)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    record_task_activity(
        &state,
        &updated,
        auth.user_id,
        ActivityAction::TaskCommented,
        None,
    )
    .await;

    Ok(Json(updated))
}

/// Archive an active task
pub async fn archive_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let (_task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot archive tasks")?;

    let archived = Task::archive(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Task is in the trash".to_string()))?;

    record_task_activity(&state, &archived, auth.user_id, ActivityAction::TaskArchived, None)
        .await;

    Ok(Json(archived))
}

/// Bring an archived task back to active
pub async fn unarchive_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let (_task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot archive tasks")?;

    let unarchived = Task::unarchive(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Task is in the trash".to_string()))?;

    record_task_activity(
        &state,
        &unarchived,
        auth.user_id,
        ActivityAction::TaskRestored,
        Some("unarchived"),
    )
    .await;

    Ok(Json(unarchived))
}

/// Move a task to the trash
pub async fn trash_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let (_task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot delete tasks")?;

    let trashed = Task::trash(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Task is already in the trash".to_string()))?;

    record_task_activity(&state, &trashed, auth.user_id, ActivityAction::TaskDeleted, None).await;

    Ok(Json(trashed))
}

/// Restore a task from the trash
///
/// Restore always lands in the active view, even if the task was archived
/// when it was trashed.
pub async fn restore_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let (_task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot restore tasks")?;

    let restored = Task::restore(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Task is not in the trash".to_string()))?;

    record_task_activity(
        &state,
        &restored,
        auth.user_id,
        ActivityAction::TaskRestored,
        Some("restored from trash"),
    )
    .await;

    Ok(Json(restored))
}

/// Permanently delete a trashed task
pub async fn purge_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let (task, project) = load_accessible(&state, id, Some(auth.user_id)).await?;
    require_edit(&project, auth.user_id, "Viewers cannot delete tasks")?;
    require_trashed(task.deleted_at, "Task is not in the trash")?;

    if !Task::purge(&state.db, id).await? {
        return Err(ApiError::Conflict("Task is not in the trash".to_string()));
    }

    Activity::record(
        &state.db,
        NewActivity {
            project: project.id,
            user: Some(auth.user_id),
            action: ActivityAction::TaskDeleted,
            entity_type: ActivityEntityType::Task,
            entity_id: Some(task.id),
            entity_title: Some(task.title.clone()),
            details: Some("permanently deleted".to_string()),
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn record_task_activity(
    state: &AppState,
    task: &Task,
    user: Uuid,
    action: ActivityAction,
    details: Option<&str>,
) {
    Activity::record(
        &state.db,
        NewActivity {
            project: task.project,
            user: Some(user),
            action,
            entity_type: ActivityEntityType::Task,
            entity_id: Some(task.id),
            entity_title: Some(task.title.clone()),
            details: details.map(|d| d.to_string()),
        },
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_requires_description() {
        let request = CreateTaskRequest {
            title: "Ship it".to_string(),
            description: "".to_string(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            project: Uuid::new_v4(),
            assigned_to: None,
            subtasks: Vec::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let json = serde_json::json!({
            "title": "Ship it",
            "description": "Cut the release",
            "project": Uuid::new_v4(),
        });

        let request: CreateTaskRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.status, TaskStatus::Todo);
        assert_eq!(request.priority, TaskPriority::Medium);
        assert!(request.subtasks.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_request_assignee_null_vs_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.assigned_to.is_none());

        let null: UpdateTaskRequest =
            serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        assert_eq!(null.assigned_to, Some(None));
    }

    #[test]
    fn test_comment_request_validation() {
        let empty = AddCommentRequest {
            text: "".to_string(),
        };
        assert!(empty.validate().is_err());
    }
}
