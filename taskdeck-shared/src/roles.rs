/// Project role resolution and permission checks
///
/// This module answers two questions for every request that touches a
/// project: "what is this user's role here?" and "may they do this?".
///
/// # Roles
///
/// - **owner**: the project creator; sole holder of member-management and
///   permanent-delete rights
/// - **editor**: may edit project metadata and fully manage tasks
/// - **viewer**: read-only access
///
/// A user with no role at all must be treated as if the project does not
/// exist: read paths map "no role" to a not-found response so that project
/// existence is never leaked.
///
/// # Legacy member format
///
/// Member lists were originally stored as bare user references with no role
/// field; those entries predate per-member roles and were semantically always
/// editors. [`resolve_role`] therefore defaults any entry without an explicit
/// `editor`/`viewer` role to editor. See [`MemberEntry`] for the shape
/// handling.
///
/// # Example
///
/// ```
/// use taskdeck_shared::roles::{resolve_role, can_edit_tasks, ProjectRole};
///
/// # fn example(project: &taskdeck_shared::models::project::Project, user: uuid::Uuid) {
/// match resolve_role(project, Some(user)) {
///     Some(ProjectRole::Owner) => println!("creator"),
///     Some(role) => println!("member: {}", role.as_str()),
///     None => println!("no access"),
/// }
/// assert_eq!(can_edit_tasks(project, Some(user)),
///            resolve_role(project, Some(user)).map_or(false, |r| r.can_edit()));
/// # }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::project::Project;

/// A user's role within a single project
///
/// Variants are declared in ascending privilege so the derived `Ord` gives
/// Viewer < Editor < Owner. "No role" is modeled as `None` at the
/// `Option<ProjectRole>` level and sorts below every role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Read-only access to the project and its tasks
    Viewer,

    /// Can edit project metadata and fully manage tasks
    Editor,

    /// The project creator: everything an editor can, plus member management
    /// and permanent deletion
    Owner,
}

impl ProjectRole {
    /// Converts role to string for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Editor => "editor",
            ProjectRole::Viewer => "viewer",
        }
    }

    /// Can edit project metadata (title, description, due date, archive flag)
    /// and create/update/delete/comment on tasks
    pub fn can_edit(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::Editor)
    }

    /// Can change the member list or member roles
    pub fn can_manage_members(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }

    /// Can permanently delete the project out of the trash
    pub fn can_permanent_delete(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }
}

/// Resolves a user's role on a project
///
/// Resolution order:
///
/// 1. No user or the project has no recorded creator match: fall through.
///    A missing `user_id` always resolves to no role.
/// 2. The project creator is the owner. A project whose `created_by` was
///    cleared (creator account deleted) can never resolve anyone to owner;
///    only member entries grant access then.
/// 3. First member entry whose extracted user id matches wins. An explicit
///    `editor` or `viewer` role is honored; anything else (legacy bare
///    reference, missing role, or a stray `owner` tag that was never a valid
///    member role) counts as editor.
///
/// Returns `None` when the user has no access at all.
pub fn resolve_role(project: &Project, user_id: Option<Uuid>) -> Option<ProjectRole> {
    let uid = user_id?;

    if project.created_by == Some(uid) {
        return Some(ProjectRole::Owner);
    }

    for entry in project.members.iter() {
        if entry.user_id() == Some(uid) {
            return Some(match entry.role() {
                Some(ProjectRole::Viewer) => ProjectRole::Viewer,
                Some(ProjectRole::Editor) => ProjectRole::Editor,
                // Legacy entries carry no role field; "owner" in a member
                // entry is not honored (the owner is never listed in members).
                Some(ProjectRole::Owner) | None => ProjectRole::Editor,
            });
        }
    }

    None
}

/// Can edit project metadata (owner or editor). Does NOT cover membership
/// changes; see [`can_manage_members`].
pub fn can_edit_project(project: &Project, user_id: Option<Uuid>) -> bool {
    resolve_role(project, user_id).is_some_and(|r| r.can_edit())
}

/// Can change the member list (owner only)
pub fn can_manage_members(project: &Project, user_id: Option<Uuid>) -> bool {
    resolve_role(project, user_id).is_some_and(|r| r.can_manage_members())
}

/// Can move the project to trash (owner or editor)
pub fn can_delete_project(project: &Project, user_id: Option<Uuid>) -> bool {
    can_edit_project(project, user_id)
}

/// Can restore the project from trash (same predicate as delete)
pub fn can_restore_project(project: &Project, user_id: Option<Uuid>) -> bool {
    can_delete_project(project, user_id)
}

/// Can permanently delete the project (owner only)
pub fn can_permanent_delete_project(project: &Project, user_id: Option<Uuid>) -> bool {
    resolve_role(project, user_id).is_some_and(|r| r.can_permanent_delete())
}

/// Can create/update/comment/delete/archive/restore tasks in the project
/// (owner or editor; viewers are strictly read-only)
pub fn can_edit_tasks(project: &Project, user_id: Option<Uuid>) -> bool {
    can_edit_project(project, user_id)
}

/// Has any access to the project (any role). Callers must map `false` on
/// read paths to a not-found response, never to forbidden.
pub fn has_project_access(project: &Project, user_id: Option<Uuid>) -> bool {
    resolve_role(project, user_id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{MemberEntry, Project, UserRef};
    use chrono::Utc;
    use sqlx::types::Json;

    fn project(created_by: Option<Uuid>, members: Vec<MemberEntry>) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            description: String::new(),
            created_by,
            members: Json(members),
            due_date: None,
            deleted_at: None,
            archived: false,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(user: Uuid, role: Option<ProjectRole>) -> MemberEntry {
        MemberEntry::Record {
            user: UserRef::Id(user),
            role,
        }
    }

    #[test]
    fn test_role_ordering() {
        assert!(ProjectRole::Owner > ProjectRole::Editor);
        assert!(ProjectRole::Editor > ProjectRole::Viewer);
        assert!(Some(ProjectRole::Viewer) > None::<ProjectRole>);
    }

    #[test]
    fn test_owner_iff_creator() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let p = project(Some(owner), vec![]);

        assert_eq!(resolve_role(&p, Some(owner)), Some(ProjectRole::Owner));
        assert_eq!(resolve_role(&p, Some(other)), None);
    }

    #[test]
    fn test_no_user_or_no_creator() {
        let owner = Uuid::new_v4();
        let p = project(Some(owner), vec![]);
        assert_eq!(resolve_role(&p, None), None);

        // A project with no recorded creator never resolves anyone to owner.
        let orphan = project(None, vec![]);
        assert_eq!(resolve_role(&orphan, Some(owner)), None);
    }

    #[test]
    fn test_explicit_member_role_wins() {
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let p = project(
            Some(owner),
            vec![
                record(viewer, Some(ProjectRole::Viewer)),
                record(editor, Some(ProjectRole::Editor)),
            ],
        );

        assert_eq!(resolve_role(&p, Some(viewer)), Some(ProjectRole::Viewer));
        assert_eq!(resolve_role(&p, Some(editor)), Some(ProjectRole::Editor));
    }

    #[test]
    fn test_legacy_bare_members_are_editors() {
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let p = project(
            Some(owner),
            vec![
                MemberEntry::Bare(UserRef::Id(a)),
                MemberEntry::Bare(UserRef::Id(b)),
            ],
        );

        assert_eq!(resolve_role(&p, Some(a)), Some(ProjectRole::Editor));
        assert_eq!(resolve_role(&p, Some(b)), Some(ProjectRole::Editor));
    }

    #[test]
    fn test_member_role_missing_defaults_to_editor() {
        let user = Uuid::new_v4();
        let p = project(Some(Uuid::new_v4()), vec![record(user, None)]);
        assert_eq!(resolve_role(&p, Some(user)), Some(ProjectRole::Editor));
    }

    #[test]
    fn test_stray_owner_tag_is_not_honored() {
        let user = Uuid::new_v4();
        let p = project(
            Some(Uuid::new_v4()),
            vec![record(user, Some(ProjectRole::Owner))],
        );
        assert_eq!(resolve_role(&p, Some(user)), Some(ProjectRole::Editor));
    }

    #[test]
    fn test_creator_wins_over_member_entry() {
        // The owner should never appear in members, but if bad data does
        // list them, step 2 wins before the member scan runs.
        let owner = Uuid::new_v4();
        let p = project(Some(owner), vec![record(owner, Some(ProjectRole::Viewer))]);
        assert_eq!(resolve_role(&p, Some(owner)), Some(ProjectRole::Owner));
    }

    #[test]
    fn test_manage_members_is_owner_only() {
        let owner = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let p = project(
            Some(owner),
            vec![
                record(editor, Some(ProjectRole::Editor)),
                record(viewer, Some(ProjectRole::Viewer)),
            ],
        );

        assert!(can_manage_members(&p, Some(owner)));
        assert!(!can_manage_members(&p, Some(editor)));
        assert!(!can_manage_members(&p, Some(viewer)));
        assert!(!can_manage_members(&p, None));
    }

    #[test]
    fn test_edit_and_delete_gates() {
        let owner = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let p = project(
            Some(owner),
            vec![
                record(editor, Some(ProjectRole::Editor)),
                record(viewer, Some(ProjectRole::Viewer)),
            ],
        );

        assert!(can_edit_project(&p, Some(owner)));
        assert!(can_edit_project(&p, Some(editor)));
        assert!(!can_edit_project(&p, Some(viewer)));
        assert!(!can_edit_project(&p, Some(stranger)));

        assert!(can_delete_project(&p, Some(editor)));
        assert!(can_restore_project(&p, Some(editor)));
        assert!(!can_delete_project(&p, Some(viewer)));

        assert!(can_permanent_delete_project(&p, Some(owner)));
        assert!(!can_permanent_delete_project(&p, Some(editor)));

        assert!(can_edit_tasks(&p, Some(editor)));
        assert!(!can_edit_tasks(&p, Some(viewer)));

        assert!(has_project_access(&p, Some(viewer)));
        assert!(!has_project_access(&p, Some(stranger)));
        assert!(!has_project_access(&p, None));
    }
}
