//! Flat output rows for analytics sinks.
//!
//! An [`ActionRow`] is a snapshot with every nested value flattened: users
//! become key/username/display-name columns, multivalued fields are joined
//! with `|`, and dates are spread over their encodings. Rows serialize to
//! JSON directly (one object per line) or to TSV through
//! [`ActionRow::columns`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::dates::DateEncodings;
use crate::dwell::StatusDwell;
use crate::model::action::{Action, MULTIVALUE_SEPARATOR};
use crate::model::user::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    pub kind: String,
    pub fields_changed: String,
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

    pub actor_key: String,
    pub actor_username: String,
    pub actor_display_name: String,
    pub assignee_key: String,
    pub assignee_username: String,
    pub assignee_display_name: String,
    pub reporter_key: String,
    pub reporter_username: String,
    pub reporter_display_name: String,

    pub status: String,
    pub prev_status: String,
    pub status_history: String,
    pub status_dwell: StatusDwell,

    pub issue_age: i64,
    pub time_in_state: i64,
    pub time_since_action: i64,
    pub timestamp: String,
    pub last_updated: i64,

    pub fix_versions: String,
    pub components: String,
    pub links: String,

    pub created_date: String,
    pub created_day: i64,
    pub created_date_time: i64,
    pub created_timestamp: i64,
    pub resolution_date: String,
    pub resolution_day: i64,
    pub resolution_date_time: i64,
    pub resolution_timestamp: i64,
    pub closed_date: i64,

    pub comments: i64,
    pub delivery_lead_time: i64,
    pub time_original_estimate: i64,
    pub aggregate_time_original_estimate: i64,
    pub time_estimate: i64,
    pub aggregate_time_estimate: i64,
    pub time_spent: i64,
    pub aggregate_time_spent: i64,
    pub work_ratio: i64,

    /// One column per configured custom field, named by identifier.
    #[serde(flatten)]
    pub custom_fields: BTreeMap<String, String>,
}

fn user_columns(user: &User) -> [String; 3] {
    [
        user.key.clone(),
        user.username.clone(),
        user.display_name.clone(),
    ]
}

fn column(name: &str, value: &dyn fmt::Display) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn date_columns(date: &DateEncodings) -> (String, i64, i64, i64) {
    (date.date.clone(), date.day, date.date_time, date.timestamp)
}

impl From<&Action> for ActionRow {
    fn from(action: &Action) -> Self {
        let [actor_key, actor_username, actor_display_name] = user_columns(&action.actor);
        let [assignee_key, assignee_username, assignee_display_name] =
            user_columns(&action.assignee);
        let [reporter_key, reporter_username, reporter_display_name] =
            user_columns(&action.reporter);
        let (created_date, created_day, created_date_time, created_timestamp) =
            date_columns(&action.created);
        let (resolution_date, resolution_day, resolution_date_time, resolution_timestamp) =
            date_columns(&action.resolution_date);
        let tracking = action.time_tracking;

        Self {
            kind: action.kind.as_str().to_string(),
            fields_changed: action.fields_changed.clone(),
            issue_key: action.issue_key.clone(),
            issue_type: action.issue_type.clone(),
            priority: action.priority.clone(),
            project: action.project.clone(),
            project_key: action.project_key.clone(),
            resolution: action.resolution.clone(),
            category: action.category.clone(),
            labels: action.labels.clone(),
            summary: action.summary.clone(),
            due_date: action.due_date.clone(),
            actor_key,
            actor_username,
            actor_display_name,
            assignee_key,
            assignee_username,
            assignee_display_name,
            reporter_key,
            reporter_username,
            reporter_display_name,
            status: action.status.clone(),
            prev_status: action.prev_status.clone(),
            status_history: action.status_history_joined(),
            status_dwell: action.status_dwell.clone(),
            issue_age: action.issue_age,
            time_in_state: action.time_in_state,
            time_since_action: action.time_since_action,
            timestamp: action.timestamp.to_rfc3339(),
            last_updated: action.last_updated,
            fix_versions: action.fix_versions_joined(),
            components: action.components_joined(),
            links: action.links_joined(),
            created_date,
            created_day,
            created_date_time,
            created_timestamp,
            resolution_date,
            resolution_day,
            resolution_date_time,
            resolution_timestamp,
            closed_date: action.closed_date,
            comments: action.comments,
            delivery_lead_time: action.delivery_lead_time,
            time_original_estimate: tracking.original_estimate,
            aggregate_time_original_estimate: tracking.aggregate_original_estimate,
            time_estimate: tracking.estimate,
            aggregate_time_estimate: tracking.aggregate_estimate,
            time_spent: tracking.spent,
            aggregate_time_spent: tracking.aggregate_spent,
            work_ratio: tracking.work_ratio,
            custom_fields: action.custom_fields.clone(),
        }
    }
}

impl ActionRow {
    /// Ordered `(column, value)` pairs. The dwell map renders as
    /// `status=seconds` entries joined with `|`.
    #[must_use]
    pub fn columns(&self) -> Vec<(String, String)> {
        let dwell = self
            .status_dwell
            .iter()
            .map(|(status, seconds)| format!("{status}={seconds}"))
            .collect::<Vec<_>>()
            .join(MULTIVALUE_SEPARATOR);

        let mut columns = vec![
            column("kind", &self.kind),
            column("fields_changed", &self.fields_changed),
            column("issue_key", &self.issue_key),
            column("issue_type", &self.issue_type),
            column("priority", &self.priority),
            column("project", &self.project),
            column("project_key", &self.project_key),
            column("resolution", &self.resolution),
            column("category", &self.category),
            column("labels", &self.labels),
            column("summary", &self.summary),
            column("due_date", &self.due_date),
            column("actor_key", &self.actor_key),
            column("actor_username", &self.actor_username),
            column("actor_display_name", &self.actor_display_name),
            column("assignee_key", &self.assignee_key),
            column("assignee_username", &self.assignee_username),
            column("assignee_display_name", &self.assignee_display_name),
            column("reporter_key", &self.reporter_key),
            column("reporter_username", &self.reporter_username),
            column("reporter_display_name", &self.reporter_display_name),
            column("status", &self.status),
            column("prev_status", &self.prev_status),
            column("status_history", &self.status_history),
            column("status_dwell", &dwell),
            column("issue_age", &self.issue_age),
            column("time_in_state", &self.time_in_state),
            column("time_since_action", &self.time_since_action),
            column("timestamp", &self.timestamp),
            column("last_updated", &self.last_updated),
            column("fix_versions", &self.fix_versions),
            column("components", &self.components),
            column("links", &self.links),
            column("created_date", &self.created_date),
            column("created_day", &self.created_day),
            column("created_date_time", &self.created_date_time),
            column("created_timestamp", &self.created_timestamp),
            column("resolution_date", &self.resolution_date),
            column("resolution_day", &self.resolution_day),
            column("resolution_date_time", &self.resolution_date_time),
            column("resolution_timestamp", &self.resolution_timestamp),
            column("closed_date", &self.closed_date),
            column("comments", &self.comments),
            column("delivery_lead_time", &self.delivery_lead_time),
            column("time_original_estimate", &self.time_original_estimate),
            column(
                "aggregate_time_original_estimate",
                &self.aggregate_time_original_estimate,
            ),
            column("time_estimate", &self.time_estimate),
            column("aggregate_time_estimate", &self.aggregate_time_estimate),
            column("time_spent", &self.time_spent),
            column("aggregate_time_spent", &self.aggregate_time_spent),
            column("work_ratio", &self.work_ratio),
        ];
        columns.extend(
            self.custom_fields
                .iter()
                .map(|(id, value)| (id.clone(), value.clone())),
        );
        columns
    }

    /// Tab-separated column names.
    #[must_use]
    pub fn tsv_header(&self) -> String {
        self.columns()
            .into_iter()
            .map(|(name, _)| escape_tsv(&name))
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Tab-separated values, in [`ActionRow::tsv_header`] order.
    #[must_use]
    pub fn tsv_line(&self) -> String {
        self.columns()
            .into_iter()
            .map(|(_, value)| escape_tsv(&value))
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// Backslash-escape characters that would break a TSV record.
#[must_use]
pub fn escape_tsv(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::PayloadCollaborators;
    use crate::config::TimelineConfig;
    use crate::dates::parse_timestamp;
    use crate::engine;
    use crate::model::issue::Issue;
    use serde_json::json;

    fn action() -> Action {
        let issue: Issue = serde_json::from_value(json!({
            "key": "OPS-5",
            "fields": {
                "created": "2020-01-01T00:00:00.000+0000",
                "creator": {"key": "alice", "name": "alice", "displayName": "Alice"},
                "status": {"name": "Open"},
                "summary": "Tabs\tand\nnewlines",
                "fixVersions": [{"name": "1.0"}, {"name": "1.1"}],
                "customfield_9": "blue"
            }
        }))
        .expect("issue");
        let mut config =
            TimelineConfig::new(parse_timestamp("end", "2020-01-02T00:00:00Z").expect("end"));
        config.custom_fields.push(crate::model::CustomFieldDefinition {
            identifier: "customfield_9".into(),
            display_name: "Colour".into(),
            field_type: "string".into(),
        });
        let collab = PayloadCollaborators::for_issue(&issue);
        engine::create(&issue, &config, collab.as_collaborators()).expect("create")
    }

    #[test]
    fn row_flattens_users_and_lists() {
        let row = ActionRow::from(&action());
        assert_eq!(row.kind, "create");
        assert_eq!(row.actor_key, "alice");
        assert_eq!(row.actor_display_name, "Alice");
        assert_eq!(row.assignee_key, "invaliduser");
        assert_eq!(row.fix_versions, "1.0|1.1");
        assert_eq!(row.created_day, 20_200_101);
        assert_eq!(row.custom_fields.get("customfield_9").map(String::as_str), Some("blue"));
    }

    #[test]
    fn json_row_is_flat() {
        let value = serde_json::to_value(ActionRow::from(&action())).expect("json");
        assert_eq!(value["issue_key"], "OPS-5");
        assert_eq!(value["customfield_9"], "blue");
        assert_eq!(value["status_dwell"]["Open"], 0);
    }

    #[test]
    fn tsv_header_and_line_align() {
        let row = ActionRow::from(&action());
        let header = row.tsv_header();
        let line = row.tsv_line();
        assert_eq!(header.split('\t').count(), line.split('\t').count());
        assert!(header.starts_with("kind\tfields_changed\tissue_key"));
        assert!(header.ends_with("work_ratio\tcustomfield_9"));
        assert!(line.contains("Tabs\\tand\\nnewlines"));
        assert!(line.contains("Open=0"));
    }

    #[test]
    fn escape_handles_backslashes() {
        assert_eq!(escape_tsv("a\\b\tc"), "a\\\\b\\tc");
    }
}
