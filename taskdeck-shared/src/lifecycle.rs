/// Soft-delete lifecycle shared by projects and tasks
///
/// Both entity types carry the same pair of lifecycle fields: a nullable
/// `deleted_at` timestamp (trash) and an `archived` flag with its own
/// timestamp. Together they place an entity in exactly one of three
/// observable states:
///
/// ```text
/// active ⇄ archived
///   │        │
///   └── trash ──(30 days or explicit purge)──▶ gone
/// ```
///
/// Restoring from trash always lands in the active state: the archived flag
/// is cleared as part of the restore, never resurrected.
///
/// The state transitions themselves are `UPDATE … RETURNING` statements on
/// the models; this module owns the classification, the query predicates for
/// the three listing views, and the retention-window math used by the sweep.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How long a trashed entity is retained before it becomes purge-eligible
pub const TRASH_RETENTION_DAYS: i64 = 30;

/// Observable lifecycle state of a project or task
///
/// Purged entities are removed from storage and therefore have no state to
/// observe; this enum only covers rows that still exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Live and visible on the board
    Active,

    /// Put away but not deleted; independent of trash
    Archived,

    /// Soft-deleted, awaiting restore or purge. The archived flag is
    /// irrelevant while trashed.
    Trashed,
}

/// Classifies an entity from its lifecycle fields
///
/// `deleted_at` dominates: a trashed entity is trashed regardless of its
/// archived flag.
pub fn classify(deleted_at: Option<DateTime<Utc>>, archived: bool) -> LifecycleState {
    if deleted_at.is_some() {
        LifecycleState::Trashed
    } else if archived {
        LifecycleState::Archived
    } else {
        LifecycleState::Active
    }
}

/// Listing view selector for projects and tasks
///
/// The three views are disjoint: any entity appears in exactly one of them
/// at any time. Parsed from the `view` query parameter; defaults to active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleView {
    /// `deleted_at IS NULL AND archived = FALSE`
    #[default]
    Active,

    /// `deleted_at IS NULL AND archived = TRUE`
    Archived,

    /// `deleted_at IS NOT NULL`
    Trashed,
}

impl LifecycleView {
    /// SQL predicate selecting this view; composes conjunctively with the
    /// access predicate on listing queries
    pub fn sql_predicate(&self) -> &'static str {
        match self {
            LifecycleView::Active => "deleted_at IS NULL AND archived = FALSE",
            LifecycleView::Archived => "deleted_at IS NULL AND archived = TRUE",
            LifecycleView::Trashed => "deleted_at IS NOT NULL",
        }
    }

    /// Whether an entity with the given lifecycle fields belongs to this view
    pub fn contains(&self, deleted_at: Option<DateTime<Utc>>, archived: bool) -> bool {
        match self {
            LifecycleView::Active => classify(deleted_at, archived) == LifecycleState::Active,
            LifecycleView::Archived => classify(deleted_at, archived) == LifecycleState::Archived,
            LifecycleView::Trashed => classify(deleted_at, archived) == LifecycleState::Trashed,
        }
    }

    /// View name as used in query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleView::Active => "active",
            LifecycleView::Archived => "archived",
            LifecycleView::Trashed => "trashed",
        }
    }
}

impl fmt::Display for LifecycleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LifecycleView::Active),
            "archived" => Ok(LifecycleView::Archived),
            "trashed" => Ok(LifecycleView::Trashed),
            other => Err(format!("unknown lifecycle view: {}", other)),
        }
    }
}

/// Timestamp before which a trashed entity is purge-eligible
pub fn purge_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(TRASH_RETENTION_DAYS)
}

/// Whether an entity has sat in the trash past the retention window
///
/// Entities that are not trashed at all are never eligible.
pub fn purge_eligible(deleted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match deleted_at {
        Some(ts) => ts < purge_cutoff(now),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let now = Utc::now();
        assert_eq!(classify(None, false), LifecycleState::Active);
        assert_eq!(classify(None, true), LifecycleState::Archived);
        assert_eq!(classify(Some(now), false), LifecycleState::Trashed);
        // deleted_at dominates the archived flag
        assert_eq!(classify(Some(now), true), LifecycleState::Trashed);
    }

    #[test]
    fn test_views_are_disjoint_and_exhaustive() {
        let now = Utc::now();
        let views = [
            LifecycleView::Active,
            LifecycleView::Archived,
            LifecycleView::Trashed,
        ];
        for (deleted_at, archived) in [
            (None, false),
            (None, true),
            (Some(now), false),
            (Some(now), true),
        ] {
            let matching = views
                .iter()
                .filter(|v| v.contains(deleted_at, archived))
                .count();
            assert_eq!(matching, 1, "entity must appear in exactly one view");
        }
    }

    #[test]
    fn test_view_parse_and_display() {
        assert_eq!("active".parse(), Ok(LifecycleView::Active));
        assert_eq!("archived".parse(), Ok(LifecycleView::Archived));
        assert_eq!("trashed".parse(), Ok(LifecycleView::Trashed));
        assert!("deleted".parse::<LifecycleView>().is_err());
        assert_eq!(LifecycleView::default(), LifecycleView::Active);
        assert_eq!(LifecycleView::Trashed.to_string(), "trashed");
    }

    #[test]
    fn test_purge_eligibility_boundary() {
        let now = Utc::now();
        let just_expired = now - Duration::days(TRASH_RETENTION_DAYS) - Duration::seconds(1);
        let still_retained = now - Duration::days(29);

        assert!(purge_eligible(Some(just_expired), now));
        assert!(!purge_eligible(Some(still_retained), now));
        assert!(!purge_eligible(None, now));
    }

    #[test]
    fn test_purge_cutoff_is_exclusive() {
        // deleted_at exactly at the cutoff is not yet eligible (strict <)
        let now = Utc::now();
        let exactly = purge_cutoff(now);
        assert!(!purge_eligible(Some(exactly), now));
    }
}
