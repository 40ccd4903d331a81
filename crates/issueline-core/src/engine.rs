//! Snapshot derivation: one previous snapshot plus one event gives the next.
//!
//! Four transitions cover an issue's life:
//!
//! - [`create`]: first snapshot from creation-time values
//! - [`update`]: apply one change-event's diffs
//! - [`comment`]: advance the clocks and bump the comment count
//! - [`to_current`]: close the timeline out at the configured end date
//!
//! [`transition`] dispatches a [`TimelineEvent`] to the matching one. Every
//! transition copies its predecessor and overrides only what the event
//! touched, so the previous snapshot is never modified.
//!
//! # Clock bookkeeping
//!
//! For an event at time `t` after a snapshot at `p`, with `Δ = t - p` in
//! whole seconds:
//!
//! - `issue_age += Δ`
//! - the dwell entry of the *previous* status grows by `Δ`
//! - `time_in_state` resets to 0 on a status change, else grows by `Δ`
//!
//! which keeps the dwell total equal to the issue age at every snapshot.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::collab::Collaborators;
use crate::config::TimelineConfig;
use crate::dates::{DateEncodings, day_number, seconds_between};
use crate::dwell::StatusDwell;
use crate::error::TimelineError;
use crate::lead_time::delivery_lead_time;
use crate::model::action::{Action, ActionKind, TimeTracking};
use crate::model::issue::{Comment, DiffItem, History, Issue};
use crate::model::user::User;
use crate::policy::{self, Diffs, TrackedField};

/// Terminal status whose entry stamps the closed date.
pub const CLOSED_STATUS: &str = "Closed";

/// One input to the snapshot state machine.
#[derive(Debug, Clone, Copy)]
pub enum TimelineEvent<'a> {
    Create(&'a Issue),
    Update(&'a History),
    Comment(&'a Comment),
    /// As-of snapshot at the configured end date.
    ToCurrent,
}

impl TimelineEvent<'_> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Comment(_) => "comment",
            Self::ToCurrent => "to_current",
        }
    }
}

/// Derive the next snapshot from `prev` and `event`.
///
/// `Create` requires `prev == None`; every other event requires a previous
/// snapshot.
///
/// # Errors
///
/// Returns [`TimelineError::MissingPrevious`] or
/// [`TimelineError::UnexpectedPrevious`] when `prev` does not fit the event,
/// plus any error of the underlying transition.
pub fn transition(
    prev: Option<&Action>,
    event: TimelineEvent<'_>,
    config: &TimelineConfig,
    collab: Collaborators<'_>,
) -> Result<Action, TimelineError> {
    match (prev, event) {
        (None, TimelineEvent::Create(issue)) => create(issue, config, collab),
        (Some(_), TimelineEvent::Create(_)) => Err(TimelineError::UnexpectedPrevious),
        (Some(prev), TimelineEvent::Update(history)) => update(prev, history, config, collab),
        (Some(prev), TimelineEvent::Comment(comment)) => self::comment(prev, comment, collab),
        (Some(prev), TimelineEvent::ToCurrent) => to_current(prev, config),
        (None, event) => Err(TimelineError::MissingPrevious { kind: event.name() }),
    }
}

/// First snapshot of an issue, built from its creation-time values.
///
/// # Errors
///
/// Fails when the creation time or the initial resolution date is
/// malformed, or when a custom-field parser fails.
pub fn create(
    issue: &Issue,
    config: &TimelineConfig,
    collab: Collaborators<'_>,
) -> Result<Action, TimelineError> {
    let created = issue.created()?;
    let initial = |field: TrackedField| issue.initial_value(field);

    let actor = issue
        .fields
        .creator
        .as_ref()
        .map_or_else(User::invalid, |creator| collab.users.resolve(Some(&creator.key)));
    let assignee = collab
        .users
        .resolve(issue.initial_value_key(TrackedField::Assignee).as_deref());
    let reporter = collab
        .users
        .resolve(issue.initial_value_key(TrackedField::Reporter).as_deref());

    let issue_key = match initial(TrackedField::IssueKey) {
        key if key.is_empty() => issue.key.clone(),
        key => key,
    };
    let status = initial(TrackedField::Status);
    let resolution_date = DateEncodings::parse(
        TrackedField::ResolutionDate.as_str(),
        &initial(TrackedField::ResolutionDate),
    )?;

    let mut custom_fields = BTreeMap::new();
    for definition in &config.custom_fields {
        let value = collab.custom_fields.parse_initial(definition, issue)?;
        custom_fields.insert(definition.identifier.clone(), value);
    }

    let action = Action {
        kind: ActionKind::Create,
        fields_changed: "created".to_string(),
        issue_key,
        issue_type: initial(TrackedField::IssueType),
        priority: initial(TrackedField::Priority),
        project: initial(TrackedField::Project),
        project_key: initial(TrackedField::ProjectKey),
        resolution: initial(TrackedField::Resolution),
        category: initial(TrackedField::Category),
        labels: initial(TrackedField::Labels),
        summary: initial(TrackedField::Summary),
        due_date: TrackedField::DueDate.clean_value(&initial(TrackedField::DueDate)),
        actor,
        assignee,
        reporter,
        prev_status: String::new(),
        status_history: vec![status.clone()],
        status_dwell: StatusDwell::seed(&status),
        status,
        issue_age: 0,
        time_in_state: 0,
        time_since_action: 0,
        timestamp: created,
        last_updated: 0,
        fix_versions: issue.initial_values(TrackedField::FixVersions),
        components: issue.initial_values(TrackedField::Components),
        links: BTreeSet::new(),
        created: DateEncodings::from_timestamp(&created),
        resolution_date,
        closed_date: 0,
        comments: 0,
        delivery_lead_time: 0,
        time_tracking: TimeTracking::default(),
        custom_fields,
    };

    debug!(issue = %action.issue_key, status = %action.status, "derived create snapshot");
    Ok(action)
}

/// Apply one change-event to `prev`.
///
/// # Errors
///
/// Fails when the event precedes `prev`, when a diff value is malformed, or
/// when a collaborator fails.
pub fn update(
    prev: &Action,
    history: &History,
    config: &TimelineConfig,
    collab: Collaborators<'_>,
) -> Result<Action, TimelineError> {
    let at = history.timestamp()?;
    let delta = elapsed(prev, &at)?;
    let actor = collab
        .users
        .resolve(history.author.as_ref().map(|author| author.key.as_str()));

    let mut next = prev.derive(ActionKind::Update, actor, at);
    next.fields_changed = history.changed_fields();
    next.delivery_lead_time = 0;
    next.last_updated = 0;

    let diffs = Diffs::new(history);
    policy::apply_plain_fields(diffs, &mut next)?;

    if let Some(item) = diffs.last(TrackedField::Assignee) {
        next.assignee = collab.users.resolve(item.to_key());
    }
    if let Some(item) = diffs.last(TrackedField::Reporter) {
        next.reporter = collab.users.resolve(item.to_key());
    }

    let link_diffs: Vec<&DiffItem> = diffs.items(TrackedField::Link).collect();
    next.links = collab.links.merge(&prev.links, &link_diffs)?;

    for definition in &config.custom_fields {
        let value = collab
            .custom_fields
            .parse_non_initial(definition, prev, history)?;
        next.custom_fields.insert(definition.identifier.clone(), value);
    }

    let status_changed = next.status != prev.status;
    next.prev_status.clone_from(&prev.status);
    advance_clock(prev, &mut next, delta, status_changed);
    if status_changed {
        next.status_history.push(next.status.clone());
    }
    next.closed_date = closed_date(prev, &next.status, &at);

    debug!(
        issue = %next.issue_key,
        fields = %next.fields_changed,
        delta,
        "derived update snapshot"
    );
    Ok(next)
}

/// Record a comment on `prev`.
///
/// # Errors
///
/// Fails when the comment time is malformed or precedes `prev`.
pub fn comment(
    prev: &Action,
    comment: &Comment,
    collab: Collaborators<'_>,
) -> Result<Action, TimelineError> {
    let at = comment.timestamp()?;
    let delta = elapsed(prev, &at)?;
    let actor = collab
        .users
        .resolve(comment.author.as_ref().map(|author| author.key.as_str()));

    let mut next = prev.derive(ActionKind::Comment, actor, at);
    next.fields_changed = "comment".to_string();
    next.comments = prev.comments + 1;
    advance_clock(prev, &mut next, delta, false);

    debug!(issue = %next.issue_key, comments = next.comments, "derived comment snapshot");
    Ok(next)
}

/// As-of snapshot at `config.end_date`, with delivery lead time filled in.
///
/// Kind, actor and `time_since_action` stay those of `prev`: this snapshot
/// describes the issue's standing, not a new action.
///
/// # Errors
///
/// Returns [`TimelineError::OutOfOrder`] when the end date precedes `prev`.
pub fn to_current(prev: &Action, config: &TimelineConfig) -> Result<Action, TimelineError> {
    let at = config.end_date;
    let delta = elapsed(prev, &at)?;

    let mut next = prev.clone();
    next.timestamp = at;
    next.issue_age = prev.issue_age + delta;
    next.status_dwell = prev.status_dwell.advance(&prev.status, delta);
    next.time_in_state = prev.time_in_state + delta;
    next.last_updated = day_number(&prev.timestamp);
    next.delivery_lead_time = delivery_lead_time(
        &next.status_dwell,
        &next.issue_type,
        &next.resolution,
        &config.delivery_lead_time,
    );

    debug!(
        issue = %next.issue_key,
        lead_time = next.delivery_lead_time,
        "derived as-of snapshot"
    );
    Ok(next)
}

fn elapsed(prev: &Action, at: &DateTime<FixedOffset>) -> Result<i64, TimelineError> {
    if *at < prev.timestamp {
        return Err(TimelineError::OutOfOrder {
            previous: prev.timestamp.to_rfc3339(),
            event: at.to_rfc3339(),
        });
    }
    Ok(seconds_between(&prev.timestamp, at))
}

fn advance_clock(prev: &Action, next: &mut Action, delta: i64, status_changed: bool) {
    next.issue_age = prev.issue_age + delta;
    next.time_since_action = delta;
    next.status_dwell = prev.status_dwell.advance(&prev.status, delta);
    if status_changed {
        next.status_dwell = next.status_dwell.advance(&next.status, 0);
        next.time_in_state = 0;
    } else {
        next.time_in_state = prev.time_in_state + delta;
    }
}

/// Most recent close wins: entering Closed stamps the day, staying keeps the
/// stamp, leaving clears it.
fn closed_date(prev: &Action, status: &str, at: &DateTime<FixedOffset>) -> i64 {
    if status != CLOSED_STATUS {
        return 0;
    }
    if prev.status == CLOSED_STATUS {
        prev.closed_date
    } else {
        day_number(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{ChangelogFieldParser, SetLinkMerger, UserDirectory};
    use crate::dates::parse_timestamp;
    use crate::model::custom_field::CustomFieldDefinition;
    use serde_json::json;

    struct Fixture {
        users: UserDirectory,
        parser: ChangelogFieldParser,
        links: SetLinkMerger,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                users: UserDirectory::new(),
                parser: ChangelogFieldParser,
                links: SetLinkMerger,
            }
        }

        fn collab(&self) -> Collaborators<'_> {
            Collaborators::new(&self.users, &self.parser, &self.links)
        }
    }

    fn config() -> TimelineConfig {
        let mut config =
            TimelineConfig::new(parse_timestamp("end", "2020-01-10T00:00:00.000+0000").expect("end"));
        config.delivery_lead_time.statuses = ["In Progress".to_string()].into_iter().collect();
        config.delivery_lead_time.types = ["Bug".to_string()].into_iter().collect();
        config.delivery_lead_time.resolutions = ["Fixed".to_string()].into_iter().collect();
        config
    }

    fn issue() -> Issue {
        serde_json::from_value(json!({
            "key": "OPS-9",
            "fields": {
                "created": "2020-01-01T00:00:00.000+0000",
                "creator": {"key": "alice", "name": "alice", "displayName": "Alice"},
                "issuetype": {"name": "Bug"},
                "status": {"name": "Open"},
                "project": {"name": "Operations", "key": "OPS"},
                "summary": "Flaky deploy",
                "components": [{"name": "Eng"}],
                "customfield_1": "gold"
            }
        }))
        .expect("issue")
    }

    fn history(at: &str, items: serde_json::Value) -> History {
        serde_json::from_value(json!({
            "author": {"key": "bob"},
            "created": at,
            "items": items
        }))
        .expect("history")
    }

    fn status_change(at: &str, from: &str, to: &str) -> History {
        history(at, json!([{"field": "status", "fromString": from, "toString": to}]))
    }

    #[test]
    fn create_seeds_snapshot() {
        let fx = Fixture::new();
        let action = create(&issue(), &config(), fx.collab()).expect("create");

        assert_eq!(action.kind, ActionKind::Create);
        assert_eq!(action.actor.key, "alice");
        assert!(action.assignee.is_invalid());
        assert_eq!(action.issue_key, "OPS-9");
        assert_eq!(action.status, "Open");
        assert_eq!(action.prev_status, "");
        assert_eq!(action.status_history, vec!["Open".to_string()]);
        assert_eq!(action.status_dwell, StatusDwell::seed("Open"));
        assert_eq!(action.components, vec!["Eng".to_string()]);
        assert_eq!(action.fields_changed, "created");
        assert_eq!(action.created.day, 20_200_101);
        assert!(!action.resolution_date.is_set());
    }

    #[test]
    fn create_without_creator_uses_sentinel() {
        let fx = Fixture::new();
        let mut issue = issue();
        issue.fields.creator = None;
        let action = create(&issue, &config(), fx.collab()).expect("create");
        assert!(action.actor.is_invalid());
    }

    #[test]
    fn update_carries_untouched_fields() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");
        let event = history(
            "2020-01-01T01:00:00.000+0000",
            json!([{"field": "priority", "fromString": "", "toString": "Critical"}]),
        );
        let next = update(&created, &event, &config(), fx.collab()).expect("update");

        assert_eq!(next.priority, "Critical");
        assert_eq!(next.summary, created.summary);
        assert_eq!(next.actor.key, "bob");
        assert_eq!(next.issue_age, 3600);
        assert_eq!(next.time_in_state, 3600);
        assert_eq!(next.time_since_action, 3600);
        assert_eq!(next.status_dwell.get("Open"), 3600);
        assert_eq!(next.prev_status, "Open");
        assert_eq!(created.priority, "");
    }

    #[test]
    fn status_change_resets_time_in_state_and_extends_history() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");
        let moved = update(
            &created,
            &status_change("2020-01-01T00:10:00.000+0000", "Open", "In Progress"),
            &config(),
            fx.collab(),
        )
        .expect("update");

        assert_eq!(moved.status, "In Progress");
        assert_eq!(moved.time_in_state, 0);
        assert_eq!(moved.status_dwell.get("Open"), 600);
        assert_eq!(moved.status_dwell.get("In Progress"), 0);
        assert!(moved.status_dwell.contains("In Progress"));
        assert_eq!(
            moved.status_history,
            vec!["Open".to_string(), "In Progress".to_string()]
        );

        let note: Comment = serde_json::from_value(json!({
            "author": {"key": "carol"},
            "created": "2020-01-01T00:15:00.000+0000"
        }))
        .expect("comment");
        let commented = comment(&moved, &note, fx.collab()).expect("comment");
        assert_eq!(commented.time_in_state, 300);
        assert_eq!(commented.status_dwell.get("In Progress"), 300);
        assert_eq!(commented.comments, 1);
        assert_eq!(commented.kind, ActionKind::Comment);
        assert_eq!(commented.fields_changed, "comment");
        assert_eq!(commented.status_dwell.total(), commented.issue_age);
    }

    #[test]
    fn closed_date_tracks_most_recent_close() {
        let fx = Fixture::new();
        let cfg = config();
        let a0 = create(&issue(), &cfg, fx.collab()).expect("create");
        let a1 = update(
            &a0,
            &status_change("2020-01-02T12:00:00.000+0000", "Open", "Closed"),
            &cfg,
            fx.collab(),
        )
        .expect("close");
        assert_eq!(a1.closed_date, 20_200_102);

        let a2 = update(
            &a1,
            &history(
                "2020-01-03T12:00:00.000+0000",
                json!([{"field": "summary", "fromString": "x", "toString": "y"}]),
            ),
            &cfg,
            fx.collab(),
        )
        .expect("edit");
        assert_eq!(a2.closed_date, 20_200_102);

        let a3 = update(
            &a2,
            &status_change("2020-01-04T12:00:00.000+0000", "Closed", "Reopened"),
            &cfg,
            fx.collab(),
        )
        .expect("reopen");
        assert_eq!(a3.closed_date, 0);

        let a4 = update(
            &a3,
            &status_change("2020-01-05T12:00:00.000+0000", "Reopened", "Closed"),
            &cfg,
            fx.collab(),
        )
        .expect("reclose");
        assert_eq!(a4.closed_date, 20_200_105);
    }

    #[test]
    fn malformed_integer_aborts() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");
        let event = history(
            "2020-01-02T00:00:00.000+0000",
            json!([{"field": "timespent", "from": "", "to": "lots", "toString": "lots"}]),
        );
        let err = update(&created, &event, &config(), fx.collab()).unwrap_err();
        assert!(matches!(err, TimelineError::MalformedInteger { .. }));
    }

    #[test]
    fn integer_fields_update_independently() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");
        let event = history(
            "2020-01-02T00:00:00.000+0000",
            json!([
                {"field": "timeestimate", "to": "7200", "toString": "7200"},
                {"field": "aggregatetimeoriginalestimate", "to": "3600", "toString": "3600"}
            ]),
        );
        let next = update(&created, &event, &config(), fx.collab()).expect("update");
        assert_eq!(next.time_tracking.estimate, 7200);
        assert_eq!(next.time_tracking.aggregate_original_estimate, 3600);
        assert_eq!(next.time_tracking.aggregate_estimate, 0);
    }

    #[test]
    fn out_of_order_event_is_rejected() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");
        let err = update(
            &created,
            &status_change("2019-12-31T23:59:59.000+0000", "Open", "Closed"),
            &config(),
            fx.collab(),
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::OutOfOrder { .. }));
    }

    #[test]
    fn assignee_and_resolution_date_follow_diffs() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");
        let event = history(
            "2020-01-02T00:00:00.000+0000",
            json!([
                {"field": "assignee", "from": null, "to": "dave", "toString": "Dave"},
                {"field": "resolutiondate", "to": "2020-01-02T00:00:00.000+0000"}
            ]),
        );
        let next = update(&created, &event, &config(), fx.collab()).expect("update");
        assert_eq!(next.assignee.key, "dave");
        assert_eq!(next.resolution_date.day, 20_200_102);

        let cleared = history(
            "2020-01-03T00:00:00.000+0000",
            json!([
                {"field": "assignee", "from": "dave", "fromString": "Dave", "to": null},
                {"field": "resolutiondate", "from": "2020-01-02T00:00:00.000+0000", "to": null}
            ]),
        );
        let after = update(&next, &cleared, &config(), fx.collab()).expect("update");
        assert!(after.assignee.is_invalid());
        assert_eq!(after.resolution_date, DateEncodings::default());
    }

    #[test]
    fn to_current_computes_lead_time_and_is_idempotent() {
        let fx = Fixture::new();
        let cfg = config();
        let a0 = create(&issue(), &cfg, fx.collab()).expect("create");
        let a1 = update(
            &a0,
            &status_change("2020-01-02T00:00:00.000+0000", "Open", "In Progress"),
            &cfg,
            fx.collab(),
        )
        .expect("start");
        let a2 = update(
            &a1,
            &history(
                "2020-01-03T00:00:00.000+0000",
                json!([
                    {"field": "status", "fromString": "In Progress", "toString": "Closed"},
                    {"field": "resolution", "fromString": "", "toString": "Fixed"}
                ]),
            ),
            &cfg,
            fx.collab(),
        )
        .expect("close");

        let current = to_current(&a2, &cfg).expect("current");
        assert_eq!(current.delivery_lead_time, 86_400);
        assert_eq!(current.timestamp, cfg.end_date);
        assert_eq!(current.last_updated, 20_200_103);
        assert_eq!(current.status_dwell.total(), current.issue_age);
        assert_eq!(current.issue_age, 9 * 86_400);
        assert_eq!(current.kind, ActionKind::Update);

        assert_eq!(to_current(&a2, &cfg).expect("again"), current);
    }

    #[test]
    fn custom_fields_seed_and_follow_diffs() {
        let fx = Fixture::new();
        let mut cfg = config();
        cfg.custom_fields.push(CustomFieldDefinition {
            identifier: "customfield_1".into(),
            display_name: "Tier".into(),
            field_type: "string".into(),
        });
        let a0 = create(&issue(), &cfg, fx.collab()).expect("create");
        assert_eq!(a0.custom_field("customfield_1"), Some("gold"));

        let a1 = update(
            &a0,
            &history(
                "2020-01-02T00:00:00.000+0000",
                json!([{"field": "Tier", "fieldId": "customfield_1", "fromString": "gold", "toString": "platinum"}]),
            ),
            &cfg,
            fx.collab(),
        )
        .expect("update");
        assert_eq!(a1.custom_field("customfield_1"), Some("platinum"));

        let a2 = update(
            &a1,
            &status_change("2020-01-03T00:00:00.000+0000", "Open", "In Progress"),
            &cfg,
            fx.collab(),
        )
        .expect("update");
        assert_eq!(a2.custom_field("customfield_1"), Some("platinum"));
    }

    #[test]
    fn custom_field_named_type_leaves_issue_type_alone() {
        let fx = Fixture::new();
        let cfg = config();
        let issue: Issue = serde_json::from_value(json!({
            "key": "OPS-10",
            "fields": {
                "created": "2020-01-01T00:00:00.000+0000",
                "creator": {"key": "alice"},
                "issuetype": {"name": "Bug"},
                "status": {"name": "Closed"},
                "resolution": {"name": "Fixed"}
            },
            "changelog": {"histories": [
                {"author": {"key": "bob"}, "created": "2020-01-02T00:00:00.000+0000", "items": [
                    {"field": "status", "fieldtype": "jira", "fieldId": "status",
                     "fromString": "Open", "toString": "In Progress"}
                ]},
                {"author": {"key": "bob"}, "created": "2020-01-03T00:00:00.000+0000", "items": [
                    {"field": "Type", "fieldtype": "custom", "fieldId": "customfield_10500",
                     "fromString": "Internal", "toString": "Customer"},
                    {"field": "Label", "fieldtype": "custom",
                     "fromString": "", "toString": "urgent"},
                    {"field": "status", "fieldtype": "jira", "fieldId": "status",
                     "fromString": "In Progress", "toString": "Closed"},
                    {"field": "resolution", "fieldtype": "jira", "fieldId": "resolution",
                     "fromString": "", "toString": "Fixed"}
                ]}
            ]}
        }))
        .expect("issue");

        let mut action = create(&issue, &cfg, fx.collab()).expect("create");
        assert_eq!(action.issue_type, "Bug");
        assert_eq!(action.status, "Open");
        for event in issue.histories() {
            action = update(&action, event, &cfg, fx.collab()).expect("update");
        }
        assert_eq!(action.issue_type, "Bug");
        assert_eq!(action.labels, "");
        assert_eq!(action.fields_changed, "type,label,status,resolution");

        let current = to_current(&action, &cfg).expect("current");
        assert_eq!(current.delivery_lead_time, 86_400);
    }

    #[test]
    fn missing_authors_resolve_to_sentinel() {
        let fx = Fixture::new();
        let created = create(&issue(), &config(), fx.collab()).expect("create");

        let anonymous: History = serde_json::from_value(json!({
            "author": null,
            "created": "2020-01-02T00:00:00.000+0000",
            "items": [{"field": "summary", "fromString": "Flaky deploy", "toString": "Deploy"}]
        }))
        .expect("history");
        let updated = update(&created, &anonymous, &config(), fx.collab()).expect("update");
        assert!(updated.actor.is_invalid());
        assert_eq!(updated.summary, "Deploy");

        let null_author: Comment = serde_json::from_value(json!({
            "author": null,
            "created": "2020-01-03T00:00:00.000+0000"
        }))
        .expect("comment");
        let commented = comment(&updated, &null_author, fx.collab()).expect("comment");
        assert!(commented.actor.is_invalid());

        let no_author: Comment = serde_json::from_value(json!({
            "created": "2020-01-04T00:00:00.000+0000"
        }))
        .expect("comment");
        let commented = comment(&commented, &no_author, fx.collab()).expect("comment");
        assert!(commented.actor.is_invalid());
    }

    #[test]
    fn transition_enforces_state_machine() {
        let fx = Fixture::new();
        let cfg = config();
        let issue = issue();

        let err = transition(None, TimelineEvent::ToCurrent, &cfg, fx.collab()).unwrap_err();
        assert_eq!(err, TimelineError::MissingPrevious { kind: "to_current" });

        let first =
            transition(None, TimelineEvent::Create(&issue), &cfg, fx.collab()).expect("create");
        let err = transition(Some(&first), TimelineEvent::Create(&issue), &cfg, fx.collab())
            .unwrap_err();
        assert_eq!(err, TimelineError::UnexpectedPrevious);

        let last =
            transition(Some(&first), TimelineEvent::ToCurrent, &cfg, fx.collab()).expect("current");
        assert_eq!(last.status_dwell.get("Open"), last.issue_age);
    }
}
