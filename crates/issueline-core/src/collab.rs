//! Collaborators the engine calls out to mid-timeline.
//!
//! Each is a trait so callers can plug in a remote user service or a
//! tracker-specific custom-field parser. The defaults here work from the
//! issue payload alone. Implementations must be `Sync`: one set of
//! collaborators serves every worker thread.

use std::collections::{BTreeSet, HashMap};

use crate::error::TimelineError;
use crate::model::action::Action;
use crate::model::custom_field::CustomFieldDefinition;
use crate::model::issue::{DiffItem, History, Issue};
use crate::model::user::User;

/// Resolve account keys to users. Never fails.
pub trait UserLookup: Sync {
    /// Resolve `key`; absent or empty keys give [`User::invalid`].
    fn resolve(&self, key: Option<&str>) -> User;
}

/// Parse custom-field values for one definition.
pub trait CustomFieldParser: Sync {
    /// Value at creation time.
    ///
    /// # Errors
    ///
    /// Implementations return [`TimelineError::CustomField`] for values they
    /// cannot interpret.
    fn parse_initial(
        &self,
        definition: &CustomFieldDefinition,
        issue: &Issue,
    ) -> Result<String, TimelineError>;

    /// Value after `history`, given the previous snapshot.
    ///
    /// # Errors
    ///
    /// As for [`CustomFieldParser::parse_initial`].
    fn parse_non_initial(
        &self,
        definition: &CustomFieldDefinition,
        prev: &Action,
        history: &History,
    ) -> Result<String, TimelineError>;
}

/// Fold link diffs into the previous link set.
pub trait LinkMerger: Sync {
    /// # Errors
    ///
    /// Implementations return [`TimelineError::LinkMerge`] for diffs they
    /// cannot apply.
    fn merge(
        &self,
        prev: &BTreeSet<String>,
        diffs: &[&DiffItem],
    ) -> Result<BTreeSet<String>, TimelineError>;
}

/// The collaborator bundle passed to every transition.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub users: &'a dyn UserLookup,
    pub custom_fields: &'a dyn CustomFieldParser,
    pub links: &'a dyn LinkMerger,
}

impl<'a> Collaborators<'a> {
    #[must_use]
    pub const fn new(
        users: &'a dyn UserLookup,
        custom_fields: &'a dyn CustomFieldParser,
        links: &'a dyn LinkMerger,
    ) -> Self {
        Self {
            users,
            custom_fields,
            links,
        }
    }
}

// ---------------------------------------------------------------------------
// UserDirectory
// ---------------------------------------------------------------------------

/// In-memory user directory keyed by account key.
///
/// Unknown keys resolve to a key-only user rather than the sentinel, since
/// the key itself is a valid identity.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from every user embedded in `issue`.
    #[must_use]
    pub fn from_issue(issue: &Issue) -> Self {
        let mut directory = Self::new();
        directory.extend(issue.users().cloned());
        directory
    }

    pub fn insert(&mut self, user: User) {
        if user.key.is_empty() {
            return;
        }
        // Richer records win over key-only ones seen earlier.
        match self.users.get(&user.key) {
            Some(existing) if !existing.display_name.is_empty() && user.display_name.is_empty() => {}
            _ => {
                self.users.insert(user.key.clone(), user);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Extend<User> for UserDirectory {
    fn extend<T: IntoIterator<Item = User>>(&mut self, iter: T) {
        for user in iter {
            self.insert(user);
        }
    }
}

impl UserLookup for UserDirectory {
    fn resolve(&self, key: Option<&str>) -> User {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            None => User::invalid(),
            Some(key) => self
                .users
                .get(key)
                .cloned()
                .unwrap_or_else(|| User::from_key(key)),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangelogFieldParser
// ---------------------------------------------------------------------------

/// Reads custom-field values straight from the changelog.
///
/// Initial value: the earliest diff's "from" for the field, else the
/// field's current payload value. Later values: the last diff's "to" in the
/// event, else the previous snapshot's value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangelogFieldParser;

impl CustomFieldParser for ChangelogFieldParser {
    fn parse_initial(
        &self,
        definition: &CustomFieldDefinition,
        issue: &Issue,
    ) -> Result<String, TimelineError> {
        let earliest = issue
            .histories()
            .iter()
            .flat_map(|history| history.items.iter())
            .find(|item| item.targets(&definition.identifier, &definition.display_name));
        Ok(earliest.map_or_else(
            || issue.custom_value(&definition.identifier),
            |item| item.from_value().to_string(),
        ))
    }

    fn parse_non_initial(
        &self,
        definition: &CustomFieldDefinition,
        prev: &Action,
        history: &History,
    ) -> Result<String, TimelineError> {
        let latest = history
            .items
            .iter()
            .rev()
            .find(|item| item.targets(&definition.identifier, &definition.display_name));
        Ok(latest.map_or_else(
            || {
                prev.custom_field(&definition.identifier)
                    .unwrap_or_default()
                    .to_string()
            },
            |item| item.to_value().to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// SetLinkMerger
// ---------------------------------------------------------------------------

/// Link diffs as set operations: a "to" value adds, a bare "from" removes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetLinkMerger;

impl LinkMerger for SetLinkMerger {
    fn merge(
        &self,
        prev: &BTreeSet<String>,
        diffs: &[&DiffItem],
    ) -> Result<BTreeSet<String>, TimelineError> {
        let mut links = prev.clone();
        for item in diffs {
            let to = item.to_value();
            let from = item.from_value();
            if !to.is_empty() {
                links.insert(to.to_string());
            } else if !from.is_empty() {
                links.remove(from);
            } else {
                return Err(TimelineError::LinkMerge(
                    "link diff has neither a from nor a to value".to_string(),
                ));
            }
        }
        Ok(links)
    }
}

// ---------------------------------------------------------------------------
// PayloadCollaborators
// ---------------------------------------------------------------------------

/// The default collaborator set, built from one issue payload.
#[derive(Debug, Clone, Default)]
pub struct PayloadCollaborators {
    pub users: UserDirectory,
    pub custom_fields: ChangelogFieldParser,
    pub links: SetLinkMerger,
}

impl PayloadCollaborators {
    #[must_use]
    pub fn for_issue(issue: &Issue) -> Self {
        Self {
            users: UserDirectory::from_issue(issue),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn as_collaborators(&self) -> Collaborators<'_> {
        Collaborators::new(&self.users, &self.custom_fields, &self.links)
    }
}
