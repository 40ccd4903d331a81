//! Whole-issue replay: create, then every event in time order, then the
//! as-of snapshot.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::collab::Collaborators;
use crate::config::TimelineConfig;
use crate::engine::{self, TimelineEvent};
use crate::error::TimelineError;
use crate::model::action::Action;
use crate::model::issue::Issue;

/// One timed entry of the merged event stream.
#[derive(Debug, Clone, Copy)]
struct TimedEvent<'a> {
    at: DateTime<FixedOffset>,
    event: TimelineEvent<'a>,
}

/// Change-events and comments merged ascending by time.
///
/// Both inputs are sorted stably, so equal timestamps keep payload order.
/// On a tie between the two streams the change-event comes first.
fn merged_events(issue: &Issue) -> Result<Vec<TimedEvent<'_>>, TimelineError> {
    let mut histories = issue
        .histories()
        .iter()
        .map(|history| {
            history.timestamp().map(|at| TimedEvent {
                at,
                event: TimelineEvent::Update(history),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    histories.sort_by_key(|timed| timed.at);

    let comments = issue
        .sorted_comments()?
        .into_iter()
        .map(|comment| {
            comment.timestamp().map(|at| TimedEvent {
                at,
                event: TimelineEvent::Comment(comment),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = Vec::with_capacity(histories.len() + comments.len());
    let mut histories = histories.into_iter().peekable();
    let mut comments = comments.into_iter().peekable();
    loop {
        let take_history = match (histories.peek(), comments.peek()) {
            (Some(h), Some(c)) => h.at <= c.at,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_history {
            histories.next()
        } else {
            comments.next()
        };
        merged.extend(next);
    }
    Ok(merged)
}

/// Derive the full snapshot timeline of `issue`.
///
/// The result starts with the create snapshot, has one snapshot per event
/// up to `config.end_date`, and ends with the as-of snapshot. Events after
/// the end date are dropped. An issue created after the end date has no
/// timeline and yields an empty vector.
///
/// # Errors
///
/// Propagates the first [`TimelineError`] of any transition.
pub fn derive_timeline(
    issue: &Issue,
    config: &TimelineConfig,
    collab: Collaborators<'_>,
) -> Result<Vec<Action>, TimelineError> {
    let created = issue.created()?;
    if created > config.end_date {
        debug!(issue = %issue.key, "created after end date, skipping");
        return Ok(Vec::new());
    }

    let events = merged_events(issue)?;
    let mut actions: Vec<Action> = Vec::with_capacity(events.len() + 2);
    actions.push(engine::transition(
        None,
        TimelineEvent::Create(issue),
        config,
        collab,
    )?);

    let mut dropped = 0_usize;
    for timed in events {
        if timed.at > config.end_date {
            dropped += 1;
            continue;
        }
        let next = engine::transition(actions.last(), timed.event, config, collab)?;
        actions.push(next);
    }
    if dropped > 0 {
        debug!(issue = %issue.key, dropped, "ignored events after end date");
    }

    let current = engine::transition(actions.last(), TimelineEvent::ToCurrent, config, collab)?;
    actions.push(current);

    info!(issue = %issue.key, snapshots = actions.len(), "derived timeline");
    Ok(actions)
}
