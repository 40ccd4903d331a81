use serde::{Deserialize, Serialize};

/// Key used by the invalid-user sentinel.
pub const INVALID_USER_KEY: &str = "invaliduser";

/// A tracker identity as it appears on a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "accountId")]
    pub key: String,
    #[serde(default, alias = "name")]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

impl User {
    /// Sentinel for deleted, anonymous or otherwise absent accounts.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            key: INVALID_USER_KEY.to_string(),
            username: INVALID_USER_KEY.to_string(),
            display_name: "Invalid User".to_string(),
        }
    }

    /// A user known only by key; key doubles as username and display name.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            username: key.to_string(),
            display_name: key.to_string(),
        }
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.key == INVALID_USER_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_recognisable() {
        assert!(User::invalid().is_invalid());
        assert!(!User::from_key("alice").is_invalid());
    }

    #[test]
    fn tracker_payload_uses_name_alias() {
        let user: User =
            serde_json::from_str(r#"{"key":"u1","name":"alice","displayName":"Alice A"}"#)
                .expect("deserialize");
        assert_eq!(user.username, "alice");
        assert_eq!(user.display_name, "Alice A");
    }
}
