/// Project model and database operations
///
/// Projects are the unit of collaboration: a creator (owner), a member list
/// with per-member roles, and the shared soft-delete lifecycle fields.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     members JSONB NOT NULL DEFAULT '[]',
///     due_date TIMESTAMPTZ,
///     deleted_at TIMESTAMPTZ,
///     archived BOOLEAN NOT NULL DEFAULT FALSE,
///     archived_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Member list format
///
/// `members` is a JSONB array that holds two generations of data side by
/// side, with no migration required:
///
/// - legacy: `["4a9f…"]` — a bare user id, implicitly an editor
/// - current: `[{"user": "4a9f…", "role": "viewer"}]`
///
/// The `user` field of a current entry may itself be a raw id or a populated
/// user object (`{"id": "4a9f…", "name": …}`) left behind by older writers.
/// [`MemberEntry::user_id`] is the single extraction point for all shapes.
///
/// The owner is never listed in `members`; `created_by` is authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::lifecycle::{classify, LifecycleState, LifecycleView};
use crate::roles::ProjectRole;

/// SQL fragment matching a user id against the members JSONB array
///
/// Covers all three stored shapes: bare id string, record with a raw `user`
/// id, and record with a populated `user` object. The bound uuid parameter is
/// cast to text so the comparison is by canonical string form.
macro_rules! member_match_sql {
    ($param:literal) => {
        concat!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(members) AS m \
             WHERE m #>> '{}' = ", $param, "::text \
             OR m ->> 'user' = ", $param, "::text \
             OR m -> 'user' ->> 'id' = ", $param, "::text)"
        )
    };
}

const PROJECT_COLUMNS: &str = "id, title, description, created_by, members, due_date, \
                               deleted_at, archived, archived_at, created_at, updated_at";

/// A user reference as stored inside the members array
///
/// Older writers persisted whole user documents ("populated" references);
/// newer ones store the raw id. Both compare by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    /// Raw user id
    Id(Uuid),

    /// Populated user object; extra fields beyond the id are ignored
    Populated(PopulatedUser),
}

/// The subset of a populated user reference we care about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulatedUser {
    /// User id
    pub id: Uuid,

    /// Display name, if the writer included it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserRef {
    /// Unwraps the referenced user id regardless of representation
    pub fn id(&self) -> Uuid {
        match self {
            UserRef::Id(id) => *id,
            UserRef::Populated(user) => user.id,
        }
    }
}

/// One entry in a project's member list
///
/// The untagged deserialization is the discriminated-extraction step: a JSON
/// object lands in `Record`, a bare id lands in `Bare`. Entries that match
/// neither shape deserialize to `Unrecognized` and grant nobody access
/// rather than failing the whole project row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberEntry {
    /// Current shape: `{user, role}`; `role` may be absent in data written
    /// before roles existed on records
    Record {
        user: UserRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<ProjectRole>,
    },

    /// Legacy shape: a bare user reference, semantically an editor
    Bare(UserRef),

    /// Anything else found in the array; ignored by role resolution
    Unrecognized(serde_json::Value),
}

impl MemberEntry {
    /// Extracts the member's user id, trying the nested populated id, the
    /// raw user field, then the bare id
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            MemberEntry::Record { user, .. } => Some(user.id()),
            MemberEntry::Bare(user) => Some(user.id()),
            MemberEntry::Unrecognized(_) => None,
        }
    }

    /// The explicit role carried by this entry, if any
    pub fn role(&self) -> Option<ProjectRole> {
        match self {
            MemberEntry::Record { role, .. } => *role,
            MemberEntry::Bare(_) | MemberEntry::Unrecognized(_) => None,
        }
    }
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project id
    pub id: Uuid,

    /// Project title
    pub title: String,

    /// Free-text description (empty by default)
    pub description: String,

    /// The creator and sole owner. Null if the creator's account was
    /// deleted; such a project can only be accessed via member entries.
    pub created_by: Option<Uuid>,

    /// Member list; see the module docs for the accepted shapes
    pub members: Json<Vec<MemberEntry>>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the project was moved to trash (null = not trashed)
    pub deleted_at: Option<DateTime<Utc>>,

    /// Archived flag; irrelevant while trashed
    pub archived: bool,

    /// When the project was archived (null = not archived)
    pub archived_at: Option<DateTime<Utc>>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project title (must be non-empty)
    pub title: String,

    /// Description (defaults to empty)
    #[serde(default)]
    pub description: String,

    /// The creating user; becomes the owner
    pub created_by: Option<Uuid>,

    /// Initial member list (already sanitized: no owner, no duplicates)
    #[serde(default)]
    pub members: Vec<MemberEntry>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for updating project fields
///
/// `None` means "leave unchanged". `due_date` is doubly optional so an
/// explicit JSON `null` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New due date; `Some(None)` clears it
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// Replacement member list (owner-only; already sanitized by the caller)
    pub members: Option<Vec<MemberEntry>>,
}

impl Project {
    /// Observable lifecycle state from the entity's own fields
    pub fn lifecycle_state(&self) -> LifecycleState {
        classify(self.deleted_at, self.archived)
    }

    /// Creates a new project
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (title, description, created_by, members, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.created_by)
        .bind(Json(data.members))
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by id, whatever its lifecycle state
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists projects in one lifecycle view, scoped to what a user may see
    ///
    /// The access predicate is "creator or present in the member list" and
    /// composes conjunctively with the view predicate. With no user the
    /// result is empty unless `open_listing` is set (deployments that expose
    /// public browsing).
    pub async fn list_visible(
        pool: &PgPool,
        user_id: Option<Uuid>,
        view: LifecycleView,
        open_listing: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let projects = match user_id {
            Some(uid) => {
                let query = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects \
                     WHERE (created_by = $1 OR {}) AND {} \
                     ORDER BY updated_at DESC",
                    member_match_sql!("$1"),
                    view.sql_predicate(),
                );
                sqlx::query_as::<_, Project>(&query)
                    .bind(uid)
                    .fetch_all(pool)
                    .await?
            }
            None if open_listing => {
                let query = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE {} \
                     ORDER BY updated_at DESC",
                    view.sql_predicate(),
                );
                sqlx::query_as::<_, Project>(&query).fetch_all(pool).await?
            }
            None => Vec::new(),
        };

        Ok(projects)
    }

    /// Applies a partial update to project fields
    ///
    /// Returns the updated project, or None if it does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.members.is_some() {
            bind_count += 1;
            query.push_str(&format!(", members = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {PROJECT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(members) = data.members {
            q = q.bind(Json(members));
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// active|archived → archived. No-op returning None if trashed or missing.
    pub async fn archive(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET archived = TRUE, archived_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// archived → active
    pub async fn unarchive(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET archived = FALSE, archived_at = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// active|archived → trashed. The archived flag is left as-is; it is
    /// irrelevant while trashed.
    pub async fn trash(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// trashed → active. Restore always lands in the active view: the
    /// archived flag is cleared, even if the project was archived before it
    /// was trashed.
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET deleted_at = NULL, archived = FALSE, archived_at = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NOT NULL
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Irreversibly removes a trashed project and every task that references
    /// it, regardless of each task's own lifecycle state
    ///
    /// Only a project that is in the trash is purged; anything else is left
    /// untouched and `false` is returned. Both deletes run in one
    /// transaction, tasks first so the foreign key holds.
    pub async fn purge(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE project = $1
              AND EXISTS (SELECT 1 FROM projects WHERE id = $1 AND deleted_at IS NOT NULL)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result =
            sqlx::query("DELETE FROM projects WHERE id = $1 AND deleted_at IS NOT NULL")
                .bind(id)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of trashed projects whose retention window has expired
    ///
    /// Used by the sweep; the snapshot may race with concurrent restores,
    /// which is accepted.
    pub async fn find_expired_trashed(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM projects WHERE deleted_at IS NOT NULL AND deleted_at < $1",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Deletes all trashed projects older than the cutoff, returning how many
    pub async fn purge_expired(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM projects WHERE deleted_at IS NOT NULL AND deleted_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_member_entry_bare_id() {
        let id = Uuid::new_v4();
        let entry: MemberEntry = serde_json::from_value(json!(id.to_string())).unwrap();
        assert!(matches!(entry, MemberEntry::Bare(_)));
        assert_eq!(entry.user_id(), Some(id));
        assert_eq!(entry.role(), None);
    }

    #[test]
    fn test_member_entry_record_with_role() {
        let id = Uuid::new_v4();
        let entry: MemberEntry =
            serde_json::from_value(json!({"user": id.to_string(), "role": "viewer"})).unwrap();
        assert_eq!(entry.user_id(), Some(id));
        assert_eq!(entry.role(), Some(ProjectRole::Viewer));
    }

    #[test]
    fn test_member_entry_record_without_role() {
        let id = Uuid::new_v4();
        let entry: MemberEntry = serde_json::from_value(json!({"user": id.to_string()})).unwrap();
        assert!(matches!(entry, MemberEntry::Record { .. }));
        assert_eq!(entry.user_id(), Some(id));
        assert_eq!(entry.role(), None);
    }

    #[test]
    fn test_member_entry_populated_user() {
        let id = Uuid::new_v4();
        let entry: MemberEntry = serde_json::from_value(json!({
            "user": {"id": id.to_string(), "name": "Ada", "avatar": null},
            "role": "editor"
        }))
        .unwrap();
        assert_eq!(entry.user_id(), Some(id));
        assert_eq!(entry.role(), Some(ProjectRole::Editor));
    }

    #[test]
    fn test_member_entry_unrecognized_grants_nothing() {
        let entry: MemberEntry = serde_json::from_value(json!({"bogus": 42})).unwrap();
        assert!(matches!(entry, MemberEntry::Unrecognized(_)));
        assert_eq!(entry.user_id(), None);
        assert_eq!(entry.role(), None);
    }

    #[test]
    fn test_mixed_member_list_deserializes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let members: Vec<MemberEntry> = serde_json::from_value(json!([
            a.to_string(),
            {"user": b.to_string(), "role": "viewer"},
        ]))
        .unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user_id(), Some(a));
        assert_eq!(members[1].role(), Some(ProjectRole::Viewer));
    }

    #[test]
    fn test_member_entry_roundtrip_keeps_shape() {
        let id = Uuid::new_v4();
        let entry = MemberEntry::Record {
            user: UserRef::Id(id),
            role: Some(ProjectRole::Editor),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"user": id.to_string(), "role": "editor"}));
    }
}
