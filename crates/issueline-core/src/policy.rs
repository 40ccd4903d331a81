//! Field-diff policy: which changelog fields are tracked and how a diff for
//! each one is folded into the next snapshot.
//!
//! The changelog records deltas. For most fields the last diff's "to" value
//! is the new state, but multivalued fields (fix versions, components) log
//! one diff per element added or removed, so they are folded into the
//! previous list instead of replacing it.

use std::fmt;
use std::str::FromStr;

use crate::dates::DateEncodings;
use crate::error::TimelineError;
use crate::model::action::Action;
use crate::model::issue::{DiffItem, History};

/// How diffs for a field are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPolicy {
    /// Last diff's display value replaces the previous value.
    Verbatim,
    /// Last diff's display value parsed as `i64`; empty clears to 0.
    Integer,
    /// Each diff adds or removes one list element, in order.
    MultiValued,
    /// Last diff's value reparsed into [`DateEncodings`].
    Date,
    /// Last diff's raw key resolved through the user lookup.
    User,
    /// Delegated to the link merger.
    Link,
}

/// Every changelog field the engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedField {
    IssueKey,
    IssueType,
    Priority,
    Project,
    ProjectKey,
    Resolution,
    Status,
    Summary,
    Category,
    DueDate,
    Labels,
    FixVersions,
    Components,
    ResolutionDate,
    TimeOriginalEstimate,
    AggregateTimeOriginalEstimate,
    TimeEstimate,
    AggregateTimeEstimate,
    TimeSpent,
    AggregateTimeSpent,
    WorkRatio,
    Assignee,
    Reporter,
    Link,
}

/// Error returned when a changelog field name is not tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntrackedField {
    pub raw: String,
}

impl fmt::Display for UntrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' is not tracked", self.raw)
    }
}

impl std::error::Error for UntrackedField {}

impl TrackedField {
    pub const ALL: [Self; 24] = [
        Self::IssueKey,
        Self::IssueType,
        Self::Priority,
        Self::Project,
        Self::ProjectKey,
        Self::Resolution,
        Self::Status,
        Self::Summary,
        Self::Category,
        Self::DueDate,
        Self::Labels,
        Self::FixVersions,
        Self::Components,
        Self::ResolutionDate,
        Self::TimeOriginalEstimate,
        Self::AggregateTimeOriginalEstimate,
        Self::TimeEstimate,
        Self::AggregateTimeEstimate,
        Self::TimeSpent,
        Self::AggregateTimeSpent,
        Self::WorkRatio,
        Self::Assignee,
        Self::Reporter,
        Self::Link,
    ];

    /// Canonical changelog name (lowercase, no spaces).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IssueKey => "key",
            Self::IssueType => "issuetype",
            Self::Priority => "priority",
            Self::Project => "project",
            Self::ProjectKey => "projectkey",
            Self::Resolution => "resolution",
            Self::Status => "status",
            Self::Summary => "summary",
            Self::Category => "category",
            Self::DueDate => "duedate",
            Self::Labels => "labels",
            Self::FixVersions => "fixversions",
            Self::Components => "component",
            Self::ResolutionDate => "resolutiondate",
            Self::TimeOriginalEstimate => "timeoriginalestimate",
            Self::AggregateTimeOriginalEstimate => "aggregatetimeoriginalestimate",
            Self::TimeEstimate => "timeestimate",
            Self::AggregateTimeEstimate => "aggregatetimeestimate",
            Self::TimeSpent => "timespent",
            Self::AggregateTimeSpent => "aggregatetimespent",
            Self::WorkRatio => "workratio",
            Self::Assignee => "assignee",
            Self::Reporter => "reporter",
            Self::Link => "link",
        }
    }

    /// The policy table.
    #[must_use]
    pub const fn policy(self) -> FieldPolicy {
        match self {
            Self::IssueKey
            | Self::IssueType
            | Self::Priority
            | Self::Project
            | Self::ProjectKey
            | Self::Resolution
            | Self::Status
            | Self::Summary
            | Self::Category
            | Self::DueDate
            | Self::Labels => FieldPolicy::Verbatim,
            Self::FixVersions | Self::Components => FieldPolicy::MultiValued,
            Self::ResolutionDate => FieldPolicy::Date,
            Self::TimeOriginalEstimate
            | Self::AggregateTimeOriginalEstimate
            | Self::TimeEstimate
            | Self::AggregateTimeEstimate
            | Self::TimeSpent
            | Self::AggregateTimeSpent
            | Self::WorkRatio => FieldPolicy::Integer,
            Self::Assignee | Self::Reporter => FieldPolicy::User,
            Self::Link => FieldPolicy::Link,
        }
    }

    /// Normalise a changelog field name for lookup: lowercase, no whitespace.
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Adjust a verbatim value before it lands on the snapshot.
    #[must_use]
    pub fn clean_value(self, value: &str) -> String {
        match self {
            Self::DueDate => value.replace(" 00:00:00.0", ""),
            _ => value.to_string(),
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackedField {
    type Err = UntrackedField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = Self::normalize(s);
        let field = match normalized.as_str() {
            "fixversion" | "fixversions" => Self::FixVersions,
            "component" | "components" => Self::Components,
            "issuekey" => Self::IssueKey,
            other => {
                return Self::ALL
                    .into_iter()
                    .find(|field| field.as_str() == other)
                    .ok_or_else(|| UntrackedField { raw: s.to_string() });
            }
        };
        Ok(field)
    }
}

// ---------------------------------------------------------------------------
// Diff views
// ---------------------------------------------------------------------------

/// Diff items of one change-event grouped by tracked field, event order kept.
#[derive(Debug, Clone, Copy)]
pub struct Diffs<'a> {
    history: &'a History,
}

impl<'a> Diffs<'a> {
    #[must_use]
    pub const fn new(history: &'a History) -> Self {
        Self { history }
    }

    /// All diffs for `field`, in event order.
    pub fn items(self, field: TrackedField) -> impl Iterator<Item = &'a DiffItem> {
        self.history
            .items
            .iter()
            .filter(move |item| item.tracked_field() == Some(field))
    }

    #[must_use]
    pub fn contains(self, field: TrackedField) -> bool {
        self.items(field).next().is_some()
    }

    /// The last diff for `field`, if any.
    #[must_use]
    pub fn last(self, field: TrackedField) -> Option<&'a DiffItem> {
        self.items(field).last()
    }
}

// ---------------------------------------------------------------------------
// Policy application
// ---------------------------------------------------------------------------

/// Apply every `Verbatim`, `Integer`, `MultiValued` and `Date` field diff in
/// `diffs` to `next`, which starts as a copy of the previous snapshot.
///
/// `User` and `Link` fields need collaborators and are left to the engine.
///
/// # Errors
///
/// Fails on a malformed integer, a malformed date, or a multivalued diff
/// carrying neither a from nor a to value.
pub fn apply_plain_fields(diffs: Diffs<'_>, next: &mut Action) -> Result<(), TimelineError> {
    for field in TrackedField::ALL {
        match field.policy() {
            FieldPolicy::Verbatim => {
                if let Some(item) = diffs.last(field) {
                    *text_slot(next, field) = field.clean_value(item.to_value());
                }
            }
            FieldPolicy::Integer => {
                if let Some(item) = diffs.last(field) {
                    *integer_slot(next, field) = parse_integer(field, item.to_value())?;
                }
            }
            FieldPolicy::MultiValued => {
                if diffs.contains(field) {
                    let slot = list_slot(next, field);
                    let folded = fold_multivalued(field, slot, diffs.items(field))?;
                    *slot = folded;
                }
            }
            FieldPolicy::Date => {
                if let Some(item) = diffs.last(field) {
                    next.resolution_date = DateEncodings::parse(field.as_str(), item.to_value())?;
                }
            }
            FieldPolicy::User | FieldPolicy::Link => {}
        }
    }
    Ok(())
}

/// Fold element-level diffs into `baseline`.
///
/// Empty "to" removes the first element equal to "from"; otherwise "to" is
/// appended. Removing an element that is not present is a no-op.
///
/// # Errors
///
/// Returns [`TimelineError::EmptyMultiValuedDiff`] for a diff with neither
/// value.
pub fn fold_multivalued<'a>(
    field: TrackedField,
    baseline: &[String],
    items: impl IntoIterator<Item = &'a DiffItem>,
) -> Result<Vec<String>, TimelineError> {
    let mut values = baseline.to_vec();
    for item in items {
        let from = item.from_value();
        let to = item.to_value();
        if to.is_empty() {
            if from.is_empty() {
                return Err(TimelineError::EmptyMultiValuedDiff {
                    field: field.as_str().to_string(),
                });
            }
            if let Some(pos) = values.iter().position(|v| v == from) {
                values.remove(pos);
            }
        } else {
            values.push(to.to_string());
        }
    }
    Ok(values)
}

/// Parse an integer diff value; empty means the field was cleared.
///
/// # Errors
///
/// Returns [`TimelineError::MalformedInteger`] for non-numeric input.
pub fn parse_integer(field: TrackedField, raw: &str) -> Result<i64, TimelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| TimelineError::MalformedInteger {
            field: field.as_str().to_string(),
            value: raw.to_string(),
        })
}

// Slot accessors. Each is only reached for fields of the matching policy.

fn text_slot(action: &mut Action, field: TrackedField) -> &mut String {
    match field {
        TrackedField::IssueKey => &mut action.issue_key,
        TrackedField::IssueType => &mut action.issue_type,
        TrackedField::Priority => &mut action.priority,
        TrackedField::Project => &mut action.project,
        TrackedField::ProjectKey => &mut action.project_key,
        TrackedField::Resolution => &mut action.resolution,
        TrackedField::Status => &mut action.status,
        TrackedField::Summary => &mut action.summary,
        TrackedField::Category => &mut action.category,
        TrackedField::DueDate => &mut action.due_date,
        TrackedField::Labels => &mut action.labels,
        TrackedField::FixVersions
        | TrackedField::Components
        | TrackedField::ResolutionDate
        | TrackedField::TimeOriginalEstimate
        | TrackedField::AggregateTimeOriginalEstimate
        | TrackedField::TimeEstimate
        | TrackedField::AggregateTimeEstimate
        | TrackedField::TimeSpent
        | TrackedField::AggregateTimeSpent
        | TrackedField::WorkRatio
        | TrackedField::Assignee
        | TrackedField::Reporter
        | TrackedField::Link => unreachable!("{field} is not a verbatim field"),
    }
}

fn integer_slot(action: &mut Action, field: TrackedField) -> &mut i64 {
    let tracking = &mut action.time_tracking;
    match field {
        TrackedField::TimeOriginalEstimate => &mut tracking.original_estimate,
        TrackedField::AggregateTimeOriginalEstimate => &mut tracking.aggregate_original_estimate,
        TrackedField::TimeEstimate => &mut tracking.estimate,
        TrackedField::AggregateTimeEstimate => &mut tracking.aggregate_estimate,
        TrackedField::TimeSpent => &mut tracking.spent,
        TrackedField::AggregateTimeSpent => &mut tracking.aggregate_spent,
        TrackedField::WorkRatio => &mut tracking.work_ratio,
        TrackedField::IssueKey
        | TrackedField::IssueType
        | TrackedField::Priority
        | TrackedField::Project
        | TrackedField::ProjectKey
        | TrackedField::Resolution
        | TrackedField::Status
        | TrackedField::Summary
        | TrackedField::Category
        | TrackedField::DueDate
        | TrackedField::Labels
        | TrackedField::FixVersions
        | TrackedField::Components
        | TrackedField::ResolutionDate
        | TrackedField::Assignee
        | TrackedField::Reporter
        | TrackedField::Link => unreachable!("{field} is not an integer field"),
    }
}

fn list_slot(action: &mut Action, field: TrackedField) -> &mut Vec<String> {
    match field {
        TrackedField::FixVersions => &mut action.fix_versions,
        TrackedField::Components => &mut action.components,
        TrackedField::IssueKey
        | TrackedField::IssueType
        | TrackedField::Priority
        | TrackedField::Project
        | TrackedField::ProjectKey
        | TrackedField::Resolution
        | TrackedField::Status
        | TrackedField::Summary
        | TrackedField::Category
        | TrackedField::DueDate
        | TrackedField::Labels
        | TrackedField::ResolutionDate
        | TrackedField::TimeOriginalEstimate
        | TrackedField::AggregateTimeOriginalEstimate
        | TrackedField::TimeEstimate
        | TrackedField::AggregateTimeEstimate
        | TrackedField::TimeSpent
        | TrackedField::AggregateTimeSpent
        | TrackedField::WorkRatio
        | TrackedField::Assignee
        | TrackedField::Reporter
        | TrackedField::Link => unreachable!("{field} is not a multivalued field"),
    }
}
