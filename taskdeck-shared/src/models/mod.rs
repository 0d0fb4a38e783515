/// Database models for Taskdeck
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `project`: Projects with member lists and the soft-delete lifecycle
/// - `task`: Board tasks with subtasks and comments
/// - `activity`: Append-only, best-effort activity log
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{CreateUser, User, UserRole};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "John Doe".to_string(),
///     role: UserRole::User,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod activity;
pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializer for "absent vs explicit null" update fields
///
/// With `#[serde(default, deserialize_with = "double_option")]` an omitted
/// field stays `None` (leave unchanged) while an explicit JSON `null` becomes
/// `Some(None)` (clear the value).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::double_option")]
        due_date: Option<Option<DateTime<Utc>>>,
    }

    #[test]
    fn test_double_option_absent_vs_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert!(absent.due_date.is_none());

        let null: Patch = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert_eq!(null.due_date, Some(None));

        let set: Patch =
            serde_json::from_str(r#"{"due_date": "2026-01-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(set.due_date, Some(Some(_))));
    }
}
