//! The `Action` snapshot: one immutable, flattened view of an issue at the
//! instant something happened to it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::dates::DateEncodings;
use crate::dwell::StatusDwell;
use crate::model::user::User;

/// Separator used when multivalued fields are flattened to one string.
pub const MULTIVALUE_SEPARATOR: &str = "|";

/// What produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Comment,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-tracking counters, all in seconds except `work_ratio` (percent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTracking {
    pub original_estimate: i64,
    pub aggregate_original_estimate: i64,
    pub estimate: i64,
    pub aggregate_estimate: i64,
    pub spent: i64,
    pub aggregate_spent: i64,
    pub work_ratio: i64,
}

/// A point-in-time snapshot of an issue.
///
/// Snapshots are values: the engine builds each one from a clone of its
/// predecessor and never touches a snapshot after returning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Comma-joined names of the fields this action changed.
    pub fields_changed: String,

    // Identity and classification.
    pub issue_key: String,
    pub issue_type: String,
    pub priority: String,
    pub project: String,
    pub project_key: String,
    pub resolution: String,
    pub category: String,
    pub labels: String,
    pub summary: String,
    pub due_date: String,

    // People.
    pub actor: User,
    pub assignee: User,
    pub reporter: User,

    // Status.
    pub status: String,
    pub prev_status: String,
    pub status_history: Vec<String>,
    pub status_dwell: StatusDwell,

    // Time accounting, in seconds.
    pub issue_age: i64,
    pub time_in_state: i64,
    pub time_since_action: i64,
    pub timestamp: DateTime<FixedOffset>,
    /// `YYYYMMDD` of the last real action; only set on the as-of snapshot.
    pub last_updated: i64,

    // Multivalued.
    pub fix_versions: Vec<String>,
    pub components: Vec<String>,
    pub links: BTreeSet<String>,

    // Derived dates.
    pub created: DateEncodings,
    pub resolution_date: DateEncodings,
    /// `YYYYMMDD` of the most recent transition into Closed, 0 otherwise.
    pub closed_date: i64,

    // Counters.
    pub comments: i64,
    pub delivery_lead_time: i64,
    pub time_tracking: TimeTracking,

    /// Custom field identifier to parsed value.
    pub custom_fields: BTreeMap<String, String>,
}

impl Action {
    /// Start the next snapshot as a copy of `self` with new identity fields.
    ///
    /// The caller overrides whatever else the event affects before handing
    /// the value out.
    #[must_use]
    pub fn derive(&self, kind: ActionKind, actor: User, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            kind,
            actor,
            timestamp,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn fix_versions_joined(&self) -> String {
        self.fix_versions.join(MULTIVALUE_SEPARATOR)
    }

    #[must_use]
    pub fn components_joined(&self) -> String {
        self.components.join(MULTIVALUE_SEPARATOR)
    }

    #[must_use]
    pub fn status_history_joined(&self) -> String {
        self.status_history.join(MULTIVALUE_SEPARATOR)
    }

    #[must_use]
    pub fn links_joined(&self) -> String {
        self.links
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(MULTIVALUE_SEPARATOR)
    }

    #[must_use]
    pub fn custom_field(&self, identifier: &str) -> Option<&str> {
        self.custom_fields.get(identifier).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_timestamp;

    fn sample() -> Action {
        let ts = parse_timestamp("created", "2020-05-01T09:00:00.000+0000").expect("ts");
        Action {
            kind: ActionKind::Create,
            fields_changed: "created".into(),
            issue_key: "OPS-1".into(),
            issue_type: "Bug".into(),
            priority: "Major".into(),
            project: "Operations".into(),
            project_key: "OPS".into(),
            resolution: String::new(),
            category: String::new(),
            labels: String::new(),
            summary: "Pager storm".into(),
            due_date: String::new(),
            actor: User::from_key("alice"),
            assignee: User::invalid(),
            reporter: User::from_key("alice"),
            status: "Open".into(),
            prev_status: String::new(),
            status_history: vec!["Open".into()],
            status_dwell: StatusDwell::seed("Open"),
            issue_age: 0,
            time_in_state: 0,
            time_since_action: 0,
            timestamp: ts,
            last_updated: 0,
            fix_versions: vec!["Private launch".into(), "Public launch".into()],
            components: vec![],
            links: BTreeSet::new(),
            created: DateEncodings::from_timestamp(&ts),
            resolution_date: DateEncodings::default(),
            closed_date: 0,
            comments: 0,
            delivery_lead_time: 0,
            time_tracking: TimeTracking::default(),
            custom_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn derive_copies_and_overrides_identity() {
        let prev = sample();
        let later = parse_timestamp("t", "2020-05-02T09:00:00.000+0000").expect("ts");
        let next = prev.derive(ActionKind::Comment, User::from_key("bob"), later);

        assert_eq!(next.kind, ActionKind::Comment);
        assert_eq!(next.actor.key, "bob");
        assert_eq!(next.timestamp, later);
        assert_eq!(next.issue_key, prev.issue_key);
        assert_eq!(next.status_dwell, prev.status_dwell);
        assert_eq!(prev.kind, ActionKind::Create);
    }

    #[test]
    fn joined_views_use_pipe() {
        let action = sample();
        assert_eq!(action.fix_versions_joined(), "Private launch|Public launch");
        assert_eq!(action.components_joined(), "");
        assert_eq!(action.status_history_joined(), "Open");
    }
}
