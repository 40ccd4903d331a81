//! Issue input: the tracker's REST payload with changelog and comments.
//!
//! Only the parts the engine reads are modelled. Everything else under
//! `fields` (custom fields included) is kept as raw JSON in
//! [`IssueFields::extra`].
//!
//! The tracker only reports *current* field values. Creation-time values are
//! recovered by walking the changelog backward, see
//! [`Issue::initial_value`] and [`Issue::initial_values`].

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::dates::parse_timestamp;
use crate::error::{ErrorCode, TimelineError};
use crate::model::user::User;
use crate::policy::TrackedField;

/// Error returned when an issue payload is not valid JSON for [`Issue`].
#[derive(Debug, thiserror::Error)]
#[error("invalid issue payload: {source}")]
pub struct IssueParseError {
    #[from]
    source: serde_json::Error,
}

impl IssueParseError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::IssueParseError
    }
}

/// A `{ "name": ... }` reference (issue type, status, priority, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub project_category: Option<NamedRef>,
}

/// One field-level diff inside a change-event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffItem {
    pub field: String,
    #[serde(default)]
    pub field_id: Option<String>,
    /// `jira` for system fields, `custom` for custom fields.
    #[serde(default, rename = "fieldtype")]
    pub field_type: Option<String>,
    /// Raw "from" value (ids, account keys, seconds).
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, rename = "fromString")]
    pub from_display: Option<String>,
    /// Raw "to" value.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, rename = "toString")]
    pub to_display: Option<String>,
}

impl DiffItem {
    /// True for a custom-field diff, which never maps onto a system field.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.field_type
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("custom"))
            || self
                .field_id
                .as_deref()
                .is_some_and(|id| id.starts_with("customfield_"))
    }

    /// The tracked field this diff targets, if any. A present `fieldId`
    /// decides; the display name is only consulted without one.
    #[must_use]
    pub fn tracked_field(&self) -> Option<TrackedField> {
        if self.is_custom() {
            return None;
        }
        match self.field_id.as_deref() {
            Some(id) => id.parse().ok(),
            None => self.field.parse().ok(),
        }
    }

    /// Display "from" value, falling back to the raw value.
    #[must_use]
    pub fn from_value(&self) -> &str {
        self.from_display
            .as_deref()
            .or(self.from.as_deref())
            .unwrap_or("")
    }

    /// Display "to" value, falling back to the raw value.
    #[must_use]
    pub fn to_value(&self) -> &str {
        self.to_display
            .as_deref()
            .or(self.to.as_deref())
            .unwrap_or("")
    }

    /// Raw "to" key (account keys, ids); `None` when cleared.
    #[must_use]
    pub fn to_key(&self) -> Option<&str> {
        self.to.as_deref().filter(|key| !key.is_empty())
    }

    /// Raw "from" key; `None` when the field was previously unset.
    #[must_use]
    pub fn from_key(&self) -> Option<&str> {
        self.from.as_deref().filter(|key| !key.is_empty())
    }

    /// True when this diff names the given field id or display name.
    #[must_use]
    pub fn targets(&self, identifier: &str, display_name: &str) -> bool {
        self.field_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(identifier))
            || self.field.eq_ignore_ascii_case(identifier)
            || (!display_name.is_empty() && self.field.eq_ignore_ascii_case(display_name))
    }
}

/// A change-event: who changed what, when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub author: Option<User>,
    pub created: String,
    #[serde(default)]
    pub items: Vec<DiffItem>,
}

impl History {
    /// Parsed event time.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::MalformedDate`] when `created` does not parse.
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, TimelineError> {
        parse_timestamp("history.created", &self.created)
    }

    /// Comma-joined distinct field names in event order.
    #[must_use]
    pub fn changed_fields(&self) -> String {
        let mut names: Vec<String> = Vec::new();
        for item in &self.items {
            let name = item
                .tracked_field()
                .map_or_else(|| TrackedField::normalize(&item.field), |f| f.as_str().to_string());
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.join(",")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<History>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub author: Option<User>,
    pub created: String,
    #[serde(default)]
    pub body: String,
}

impl Comment {
    /// Parsed comment time.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::MalformedDate`] when `created` does not parse.
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, TimelineError> {
        parse_timestamp("comment.created", &self.created)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCollection {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Current field values as reported by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    pub created: String,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub reporter: Option<User>,
    #[serde(default, rename = "issuetype")]
    pub issue_type: Option<NamedRef>,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub status: Option<NamedRef>,
    #[serde(default)]
    pub resolution: Option<NamedRef>,
    #[serde(default, rename = "resolutiondate")]
    pub resolution_date: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "duedate")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub fix_versions: Vec<NamedRef>,
    #[serde(default)]
    pub components: Vec<NamedRef>,
    #[serde(default, rename = "timeoriginalestimate")]
    pub time_original_estimate: Option<i64>,
    #[serde(default, rename = "aggregatetimeoriginalestimate")]
    pub aggregate_time_original_estimate: Option<i64>,
    #[serde(default, rename = "timeestimate")]
    pub time_estimate: Option<i64>,
    #[serde(default, rename = "aggregatetimeestimate")]
    pub aggregate_time_estimate: Option<i64>,
    #[serde(default, rename = "timespent")]
    pub time_spent: Option<i64>,
    #[serde(default, rename = "aggregatetimespent")]
    pub aggregate_time_spent: Option<i64>,
    #[serde(default, rename = "workratio")]
    pub work_ratio: Option<i64>,
    #[serde(default)]
    pub comment: CommentCollection,
    /// Everything else, custom fields included.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// An issue with its full changelog and comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub fields: IssueFields,
    #[serde(default)]
    pub changelog: Changelog,
}

fn name_of(named: Option<&NamedRef>) -> String {
    named.map(|n| n.name.clone()).unwrap_or_default()
}

fn number_of(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Issue {
    /// Parse an issue from its JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`IssueParseError`] when the payload is not a valid issue.
    pub fn from_json(json: &str) -> Result<Self, IssueParseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parsed creation time.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::MalformedDate`] when `fields.created` does
    /// not parse.
    pub fn created(&self) -> Result<DateTime<FixedOffset>, TimelineError> {
        parse_timestamp("created", &self.fields.created)
    }

    /// All change-events, in payload order.
    #[must_use]
    pub fn histories(&self) -> &[History] {
        &self.changelog.histories
    }

    /// Comments sorted ascending by time; equal times keep payload order.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::MalformedDate`] when a comment time does not
    /// parse.
    pub fn sorted_comments(&self) -> Result<Vec<&Comment>, TimelineError> {
        let mut keyed = self
            .fields
            .comment
            .comments
            .iter()
            .map(|comment| comment.timestamp().map(|ts| (ts, comment)))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.sort_by_key(|(ts, _)| *ts);
        Ok(keyed.into_iter().map(|(_, comment)| comment).collect())
    }

    /// Current value of a scalar field, rendered the way the changelog
    /// renders it. Empty when unset.
    #[must_use]
    pub fn current_value(&self, field: TrackedField) -> String {
        let f = &self.fields;
        match field {
            TrackedField::IssueKey => self.key.clone(),
            TrackedField::IssueType => name_of(f.issue_type.as_ref()),
            TrackedField::Priority => name_of(f.priority.as_ref()),
            TrackedField::Project => f.project.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
            TrackedField::ProjectKey => f.project.as_ref().map(|p| p.key.clone()).unwrap_or_default(),
            TrackedField::Category => name_of(
                f.project
                    .as_ref()
                    .and_then(|p| p.project_category.as_ref()),
            ),
            TrackedField::Resolution => name_of(f.resolution.as_ref()),
            TrackedField::Status => name_of(f.status.as_ref()),
            TrackedField::Summary => f.summary.clone().unwrap_or_default(),
            TrackedField::DueDate => f.due_date.clone().unwrap_or_default(),
            TrackedField::Labels => f.labels.join(" "),
            TrackedField::FixVersions | TrackedField::Components => self.current_values(field).join("|"),
            TrackedField::ResolutionDate => f.resolution_date.clone().unwrap_or_default(),
            TrackedField::TimeOriginalEstimate => number_of(f.time_original_estimate),
            TrackedField::AggregateTimeOriginalEstimate => {
                number_of(f.aggregate_time_original_estimate)
            }
            TrackedField::TimeEstimate => number_of(f.time_estimate),
            TrackedField::AggregateTimeEstimate => number_of(f.aggregate_time_estimate),
            TrackedField::TimeSpent => number_of(f.time_spent),
            TrackedField::AggregateTimeSpent => number_of(f.aggregate_time_spent),
            TrackedField::WorkRatio => number_of(f.work_ratio),
            TrackedField::Assignee => f
                .assignee
                .as_ref()
                .map(|u| u.display_name.clone())
                .unwrap_or_default(),
            TrackedField::Reporter => f
                .reporter
                .as_ref()
                .map(|u| u.display_name.clone())
                .unwrap_or_default(),
            TrackedField::Link => String::new(),
        }
    }

    /// Current elements of a multivalued field.
    #[must_use]
    pub fn current_values(&self, field: TrackedField) -> Vec<String> {
        let refs = match field {
            TrackedField::FixVersions => &self.fields.fix_versions,
            TrackedField::Components => &self.fields.components,
            _ => return Vec::new(),
        };
        refs.iter().map(|r| r.name.clone()).collect()
    }

    fn items_for(&self, field: TrackedField) -> impl DoubleEndedIterator<Item = &DiffItem> {
        self.changelog
            .histories
            .iter()
            .flat_map(|history| history.items.iter())
            .filter(move |item| item.tracked_field() == Some(field))
    }

    /// Value of a scalar field at creation time.
    ///
    /// The earliest diff's "from" value when the changelog ever touched the
    /// field, otherwise the current value. Empty when never set.
    #[must_use]
    pub fn initial_value(&self, field: TrackedField) -> String {
        if matches!(field, TrackedField::FixVersions | TrackedField::Components) {
            return self.initial_values(field).join("|");
        }
        self.items_for(field)
            .next()
            .map_or_else(|| self.current_value(field), |item| item.from_value().to_string())
    }

    /// Elements of a multivalued field at creation time.
    ///
    /// Undoes every diff from newest to oldest: an addition is removed, a
    /// removal is restored.
    #[must_use]
    pub fn initial_values(&self, field: TrackedField) -> Vec<String> {
        let mut values = self.current_values(field);
        for item in self.items_for(field).rev() {
            let to = item.to_value();
            if to.is_empty() {
                let from = item.from_value();
                if !from.is_empty() {
                    values.push(from.to_string());
                }
            } else if let Some(pos) = values.iter().rposition(|v| v == to) {
                values.remove(pos);
            }
        }
        values
    }

    /// Account key of a user field at creation time; `None` when unset.
    #[must_use]
    pub fn initial_value_key(&self, field: TrackedField) -> Option<String> {
        if let Some(item) = self.items_for(field).next() {
            return item.from_key().map(str::to_string);
        }
        let current = match field {
            TrackedField::Assignee => self.fields.assignee.as_ref(),
            TrackedField::Reporter => self.fields.reporter.as_ref(),
            _ => None,
        };
        current.map(|user| user.key.clone()).filter(|key| !key.is_empty())
    }

    /// Raw current value of a custom field, rendered as a string.
    ///
    /// Strings are taken as-is, numbers and booleans are printed, option
    /// objects contribute their `value` or `name`, arrays are pipe-joined.
    #[must_use]
    pub fn custom_value(&self, identifier: &str) -> String {
        self.fields
            .extra
            .get(identifier)
            .map(render_json)
            .unwrap_or_default()
    }

    /// Every user embedded in the payload, for seeding a user directory.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        let f = &self.fields;
        let field_users = [f.creator.as_ref(), f.assignee.as_ref(), f.reporter.as_ref()];
        field_users
            .into_iter()
            .flatten()
            .chain(self.changelog.histories.iter().filter_map(|h| h.author.as_ref()))
            .chain(f.comment.comments.iter().filter_map(|c| c.author.as_ref()))
    }
}

fn render_json(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(render_json)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("|"),
        JsonValue::Object(map) => map
            .get("value")
            .or_else(|| map.get("name"))
            .or_else(|| map.get("displayName"))
            .map(render_json)
            .unwrap_or_default(),
    }
}
