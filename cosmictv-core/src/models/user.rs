use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account as the external authenticator exposes it.
///
/// The core never mutates credentials; it only reads `expires_at` to
/// compute the remaining subscription window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    pub name: String,
    pub registered_at: Option<String>,
    /// ISO-8601 expiry timestamp, absent when never set
    pub expires_at: Option<String>,
}

impl UserAccount {
    /// Parse the stored expiry, treating an unparsable value as absent.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Self-service subscription status, always answerable even when expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub username: String,
    pub expires_at: Option<String>,
    pub days_remaining: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(expires_at: Option<&str>) -> UserAccount {
        UserAccount {
            username: "ana".to_string(),
            name: "Ana".to_string(),
            registered_at: None,
            expires_at: expires_at.map(str::to_string),
        }
    }

    #[test]
    fn test_expiry_parses_rfc3339() {
        let acc = account(Some("2030-01-01T00:00:00Z"));
        assert!(acc.expiry().is_some());
    }

    #[test]
    fn test_expiry_absent_or_garbage_is_none() {
        assert!(account(None).expiry().is_none());
        assert!(account(Some("not-a-date")).expiry().is_none());
    }
}
