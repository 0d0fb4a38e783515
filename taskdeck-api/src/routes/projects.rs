/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /v1/projects?view=active|archived|trashed` - List visible projects
/// - `POST   /v1/projects` - Create a project (creator becomes owner)
/// - `GET    /v1/projects/:id` - Fetch one project
/// - `PUT    /v1/projects/:id` - Update metadata and (owner only) members
/// - `POST   /v1/projects/:id/archive` / `/unarchive` - Toggle archive
/// - `DELETE /v1/projects/:id` - Move to trash
/// - `POST   /v1/projects/:id/restore` - Restore from trash
/// - `DELETE /v1/projects/:id/permanent` - Permanently delete (owner only)
///
/// Reads of projects the caller cannot access return 404, indistinguishable
/// from projects that do not exist. Denied mutations on visible projects
/// return 403 with the missing permission spelled out.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::HashSet;
use taskdeck_shared::{
    auth::middleware::AuthContext,
    lifecycle::LifecycleView,
    models::{
        activity::{Activity, ActivityAction, ActivityEntityType, NewActivity},
        project::{CreateProject, MemberEntry, Project, UpdateProject},
    },
    roles::{self, ProjectRole},
};
use uuid::Uuid;
use validator::Validate;

/// Listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Lifecycle view to list (default: active)
    pub view: Option<String>,
}

impl ListQuery {
    pub(crate) fn view(&self) -> Result<LifecycleView, ApiError> {
        match self.view.as_deref() {
            None => Ok(LifecycleView::Active),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Unknown view: {}", raw))),
        }
    }
}

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Description (defaults to empty)
    #[serde(default)]
    pub description: String,

    /// Initial member list
    #[serde(default)]
    pub members: Vec<MemberEntry>,

    /// Optional due date
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New due date; explicit null clears it
    #[serde(default, deserialize_with = "taskdeck_shared::models::double_option")]
    pub due_date: Option<Option<chrono::DateTime<chrono::Utc>>>,

    /// Replacement member list (owner only)
    pub members: Option<Vec<MemberEntry>>,
}

/// Cleans a caller-supplied member list
///
/// Drops entries that do not reference a user, deduplicates by user id
/// (first entry wins), strips the owner (`created_by` is authoritative), and
/// rejects attempts to hand out the owner role through the list.
fn sanitize_members(
    entries: Vec<MemberEntry>,
    owner: Option<Uuid>,
) -> Result<Vec<MemberEntry>, ApiError> {
    let mut seen = HashSet::new();
    let mut sanitized = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(user_id) = entry.user_id() else {
            continue;
        };

        if entry.role() == Some(ProjectRole::Owner) {
            return Err(ApiError::BadRequest(
                "Member roles are limited to editor and viewer".to_string(),
            ));
        }

        if Some(user_id) == owner || !seen.insert(user_id) {
            continue;
        }

        sanitized.push(entry);
    }

    Ok(sanitized)
}

/// Loads a project the caller may see, or 404
///
/// Anonymous callers get access only when the deployment enables public
/// browsing, mirroring the listing rules.
async fn load_accessible(
    state: &AppState,
    id: Uuid,
    user_id: Option<Uuid>,
) -> Result<Project, ApiError> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let public_read = user_id.is_none() && state.public_projects();
    if !roles::has_project_access(&project, user_id) && !public_read {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(project)
}

/// List projects the caller can see, one lifecycle view at a time
pub async fn list_projects(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let view = query.view()?;
    let user_id = auth.map(|a| a.user_id);

    let projects =
        Project::list_visible(&state.db, user_id, view, state.public_projects()).await?;

    Ok(Json(projects))
}

/// Create a project
///
/// The creator becomes the owner and is never listed in `members`.
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    payload.validate()?;

    let members = sanitize_members(payload.members, Some(auth.user_id))?;

    let project = Project::create(
        &state.db,
        CreateProject {
            title: payload.title,
            description: payload.description,
            created_by: Some(auth.user_id),
            members,
            due_date: payload.due_date,
        },
    )
    .await?;

    Activity::record(
        &state.db,
        NewActivity {
            project: project.id,
            user: Some(auth.user_id),
            action: ActivityAction::ProjectCreated,
            entity_type: ActivityEntityType::Project,
            entity_id: Some(project.id),
            entity_title: Some(project.title.clone()),
            details: None,
        },
    )
    .await;

    Ok(Json(project))
}

/// Fetch one project
pub async fn get_project(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_accessible(&state, id, auth.map(|a| a.user_id)).await?;
    Ok(Json(project))
}

/// Update project metadata and, for owners, the member list
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    payload.validate()?;

    let project = load_accessible(&state, id, Some(auth.user_id)).await?;

    if payload.members.is_some() {
        if !roles::can_manage_members(&project, Some(auth.user_id)) {
            return Err(ApiError::Forbidden(
                "Only the project owner can manage members".to_string(),
            ));
        }
    } else if !roles::can_edit_project(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to edit this project".to_string(),
        ));
    }

    let members = match payload.members {
        Some(entries) => Some(sanitize_members(entries, project.created_by)?),
        None => None,
    };

    let updated = Project::update(
        &state.db,
        id,
        UpdateProject {
            title: payload.title,
            description: payload.description,
            due_date: payload.due_date,
            members,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Activity::record(
        &state.db,
        NewActivity {
            project: updated.id,
            user: Some(auth.user_id),
            action: ActivityAction::ProjectUpdated,
            entity_type: ActivityEntityType::Project,
            entity_id: Some(updated.id),
            entity_title: Some(updated.title.clone()),
            details: None,
        },
    )
    .await;

    Ok(Json(updated))
}

/// Archive an active project
pub async fn archive_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_accessible(&state, id, Some(auth.user_id)).await?;

    if !roles::can_edit_project(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to archive this project".to_string(),
        ));
    }

    let archived = Project::archive(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Project is in the trash".to_string()))?;

    record_project_update(&state, &archived, auth.user_id, "archived").await;

    Ok(Json(archived))
}

/// Bring an archived project back to active
pub async fn unarchive_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_accessible(&state, id, Some(auth.user_id)).await?;

    if !roles::can_edit_project(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to unarchive this project".to_string(),
        ));
    }

    let unarchived = Project::unarchive(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Project is in the trash".to_string()))?;

    record_project_update(&state, &unarchived, auth.user_id, "unarchived").await;

    Ok(Json(unarchived))
}

/// Move a project to the trash
pub async fn trash_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_accessible(&state, id, Some(auth.user_id)).await?;

    if !roles::can_delete_project(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete this project".to_string(),
        ));
    }

    let trashed = Project::trash(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Project is already in the trash".to_string()))?;

    Activity::record(
        &state.db,
        NewActivity {
            project: trashed.id,
            user: Some(auth.user_id),
            action: ActivityAction::ProjectDeleted,
            entity_type: ActivityEntityType::Project,
            entity_id: Some(trashed.id),
            entity_title: Some(trashed.title.clone()),
            details: None,
        },
    )
    .await;

    Ok(Json(trashed))
}

/// Restore a project from the trash
///
/// Restore always lands in the active view, even if the project was archived
/// when it was trashed.
pub async fn restore_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_accessible(&state, id, Some(auth.user_id)).await?;

    if !roles::can_restore_project(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to restore this project".to_string(),
        ));
    }

    let restored = Project::restore(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Project is not in the trash".to_string()))?;

    record_project_update(&state, &restored, auth.user_id, "restored from trash").await;

    Ok(Json(restored))
}

/// Purge is only legal from the trash
///
/// Callers re-check in SQL, so a concurrent restore between this check and
/// the delete still wins.
pub(crate) fn require_trashed(
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    conflict: &str,
) -> Result<(), ApiError> {
    if deleted_at.is_none() {
        return Err(ApiError::Conflict(conflict.to_string()));
    }
    Ok(())
}

/// Permanently delete a trashed project and every task in it
pub async fn purge_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = load_accessible(&state, id, Some(auth.user_id)).await?;

    if !roles::can_permanent_delete_project(&project, Some(auth.user_id)) {
        return Err(ApiError::Forbidden(
            "Only the project owner can permanently delete it".to_string(),
        ));
    }

    require_trashed(project.deleted_at, "Project is not in the trash")?;

    if !Project::purge(&state.db, id).await? {
        return Err(ApiError::Conflict("Project is not in the trash".to_string()));
    }

    tracing::info!(project_id = %id, user_id = %auth.user_id, "Project permanently deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn record_project_update(state: &AppState, project: &Project, user: Uuid, details: &str) {
    Activity::record(
        &state.db,
        NewActivity {
            project: project.id,
            user: Some(user),
            action: ActivityAction::ProjectUpdated,
            entity_type: ActivityEntityType::Project,
            entity_id: Some(project.id),
            entity_title: Some(project.title.clone()),
            details: Some(details.to_string()),
        },
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_shared::models::project::UserRef;

    fn record(user: Uuid, role: Option<ProjectRole>) -> MemberEntry {
        MemberEntry::Record {
            user: UserRef::Id(user),
            role,
        }
    }

    #[test]
    fn test_sanitize_strips_owner_and_duplicates() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();

        let entries = vec![
            record(owner, Some(ProjectRole::Editor)),
            record(member, Some(ProjectRole::Viewer)),
            record(member, Some(ProjectRole::Editor)),
        ];

        let sanitized = sanitize_members(entries, Some(owner)).unwrap();
        assert_eq!(sanitized.len(), 1);
        assert_eq!(sanitized[0].user_id(), Some(member));
        assert_eq!(sanitized[0].role(), Some(ProjectRole::Viewer));
    }

    #[test]
    fn test_sanitize_rejects_owner_role() {
        let entries = vec![record(Uuid::new_v4(), Some(ProjectRole::Owner))];
        assert!(matches!(
            sanitize_members(entries, None),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_sanitize_skips_unrecognized_entries() {
        let member = Uuid::new_v4();
        let entries = vec![
            MemberEntry::Unrecognized(serde_json::json!({"bogus": true})),
            record(member, None),
        ];

        let sanitized = sanitize_members(entries, None).unwrap();
        assert_eq!(sanitized.len(), 1);
        assert_eq!(sanitized[0].user_id(), Some(member));
    }

    #[test]
    fn test_purge_requires_trashed_state() {
        // An active or archived entity must land in the trash first; purge
        // on a live one is a conflict, not a silent delete.
        assert!(require_trashed(Some(chrono::Utc::now()), "Project is not in the trash").is_ok());

        let err = require_trashed(None, "Project is not in the trash").unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "Conflict: Project is not in the trash");
    }

    #[test]
    fn test_list_query_view_parsing() {
        let query = ListQuery { view: None };
        assert_eq!(query.view().unwrap(), LifecycleView::Active);

        let query = ListQuery {
            view: Some("trashed".to_string()),
        };
        assert_eq!(query.view().unwrap(), LifecycleView::Trashed);

        let query = ListQuery {
            view: Some("bogus".to_string()),
        };
        assert!(query.view().is_err());
    }
}
