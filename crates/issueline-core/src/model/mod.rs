//! Data model: snapshots, issue input, users and custom-field schema.

pub mod action;
pub mod custom_field;
pub mod issue;
pub mod user;

pub use action::{Action, ActionKind, TimeTracking};
pub use custom_field::CustomFieldDefinition;
pub use issue::{Comment, DiffItem, History, Issue};
pub use user::User;
