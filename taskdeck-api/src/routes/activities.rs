/// Activity feed endpoints
///
/// # Endpoints
///
/// - `GET /v1/activities/project/:project_id` - Latest entries, newest first
///
/// The feed is capped at the most recent 100 entries and requires the same
/// project access as any other read.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::{activity::Activity, project::Project},
    roles,
};
use uuid::Uuid;

/// Latest activity for a project, newest first
pub async fn list_project_activities(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Activity>>> {
    let user_id = auth.map(|a| a.user_id);

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let public_read = user_id.is_none() && state.public_projects();
    if !roles::has_project_access(&project, user_id) && !public_read {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let activities = Activity::list_by_project(&state.db, project_id).await?;

    Ok(Json(activities))
}
