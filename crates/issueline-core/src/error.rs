use std::fmt;

/// Machine-readable error codes for log filtering and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    CustomFieldSchemaInvalid,
    IssueParseError,
    MalformedDate,
    MalformedInteger,
    MalformedDiff,
    OutOfOrderEvent,
    InvalidTransition,
    CustomFieldParseFailed,
    LinkMergeFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::CustomFieldSchemaInvalid => "E1002",
            Self::IssueParseError => "E2001",
            Self::MalformedDate => "E2002",
            Self::MalformedInteger => "E2003",
            Self::MalformedDiff => "E2004",
            Self::OutOfOrderEvent => "E3001",
            Self::InvalidTransition => "E3002",
            Self::CustomFieldParseFailed => "E4001",
            Self::LinkMergeFailed => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::CustomFieldSchemaInvalid => "Custom field schema is invalid",
            Self::IssueParseError => "Issue payload could not be parsed",
            Self::MalformedDate => "Malformed date value",
            Self::MalformedInteger => "Malformed integer value",
            Self::MalformedDiff => "Malformed changelog diff",
            Self::OutOfOrderEvent => "Event precedes the previous snapshot",
            Self::InvalidTransition => "Invalid snapshot transition",
            Self::CustomFieldParseFailed => "Custom field value could not be parsed",
            Self::LinkMergeFailed => "Link diffs could not be merged",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the issueline config file and retry."),
            Self::CustomFieldSchemaInvalid => {
                Some("Each custom field needs an identifier, a name and a type.")
            }
            Self::IssueParseError => Some("Check that the input is an issue export with changelog."),
            Self::MalformedDate | Self::MalformedInteger | Self::MalformedDiff => {
                Some("The source changelog is inconsistent; re-export the issue and retry.")
            }
            Self::OutOfOrderEvent => {
                Some("Sort change-events and comments ascending by timestamp before replay.")
            }
            Self::InvalidTransition => Some("Start every timeline with a create transition."),
            Self::CustomFieldParseFailed | Self::LinkMergeFailed => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure while deriving one issue's timeline.
///
/// Every variant aborts the issue; callers move on to the next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("malformed date '{value}' for field {field}")]
    MalformedDate { field: String, value: String },

    #[error("malformed integer '{value}' for field {field}")]
    MalformedInteger { field: String, value: String },

    #[error("diff for field {field} has neither a from nor a to value")]
    EmptyMultiValuedDiff { field: String },

    #[error("event at {event} precedes the previous snapshot at {previous}")]
    OutOfOrder { previous: String, event: String },

    #[error("{kind} transition requires a previous snapshot")]
    MissingPrevious { kind: &'static str },

    #[error("create transition must not receive a previous snapshot")]
    UnexpectedPrevious,

    #[error("custom field {identifier}: {reason}")]
    CustomField { identifier: String, reason: String },

    #[error("link merge failed: {0}")]
    LinkMerge(String),
}

impl TimelineError {
    /// Stable machine code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedDate { .. } => ErrorCode::MalformedDate,
            Self::MalformedInteger { .. } => ErrorCode::MalformedInteger,
            Self::EmptyMultiValuedDiff { .. } => ErrorCode::MalformedDiff,
            Self::OutOfOrder { .. } => ErrorCode::OutOfOrderEvent,
            Self::MissingPrevious { .. } | Self::UnexpectedPrevious => ErrorCode::InvalidTransition,
            Self::CustomField { .. } => ErrorCode::CustomFieldParseFailed,
            Self::LinkMerge(_) => ErrorCode::LinkMergeFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, TimelineError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::CustomFieldSchemaInvalid,
            ErrorCode::IssueParseError,
            ErrorCode::MalformedDate,
            ErrorCode::MalformedInteger,
            ErrorCode::MalformedDiff,
            ErrorCode::OutOfOrderEvent,
            ErrorCode::InvalidTransition,
            ErrorCode::CustomFieldParseFailed,
            ErrorCode::LinkMergeFailed,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::MalformedDiff.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn timeline_errors_map_to_codes() {
        let err = TimelineError::MalformedInteger {
            field: "timespent".into(),
            value: "abc".into(),
        };
        assert_eq!(err.code(), ErrorCode::MalformedInteger);
        assert!(err.to_string().contains("abc"));

        let err = TimelineError::MissingPrevious { kind: "comment" };
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
        assert_eq!(err.to_string(), "comment transition requires a previous snapshot");
    }
}
