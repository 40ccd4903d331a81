//! issueline-core library.
//!
//! Derives a chronological timeline of immutable snapshots ([`Action`]) from
//! an issue's creation payload, change-events and comments.
//!
//! # Conventions
//!
//! - **Errors**: [`TimelineError`] inside the engine, `anyhow::Result` for
//!   configuration loading.
//! - **Logging**: `tracing` macros (`debug!` per transition, `info!` per
//!   derived timeline).

pub mod collab;
pub mod config;
pub mod dates;
pub mod dwell;
pub mod engine;
pub mod error;
pub mod lead_time;
pub mod model;
pub mod policy;
pub mod row;
pub mod timeline;

pub use collab::{Collaborators, PayloadCollaborators};
pub use config::TimelineConfig;
pub use engine::{TimelineEvent, transition};
pub use error::{ErrorCode, TimelineError};
pub use model::{Action, ActionKind, Issue};
pub use row::ActionRow;
pub use timeline::derive_timeline;
