//! Subscription-expiry gate.
//!
//! `days_remaining` returns -1 when the expiry is absent or unparsable,
//! 0 when lapsed, otherwise the ceiling of the remaining day count.
//! `is_expired` treats both 0 and -1 as expired: an account with no
//! expiry information is locked out, not let through. That fail-closed
//! reading is a deliberate policy and must be preserved exactly.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::SubscriptionStatus;
use crate::service::auth::Authenticator;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Sentinel for "no expiry information".
pub const NO_EXPIRY: i64 = -1;

/// Days remaining until `expires_at`, per the gate's rounding rules.
#[must_use]
pub fn days_remaining(expires_at: Option<DateTime<Utc>>) -> i64 {
    let Some(expires_at) = expires_at else {
        return NO_EXPIRY;
    };

    let diff_ms = expires_at
        .signed_duration_since(Utc::now())
        .num_milliseconds();
    let days = (diff_ms as f64 / MS_PER_DAY).ceil() as i64;
    days.max(0)
}

/// Gate wrapping every catalog read and interaction write.
#[derive(Clone)]
pub struct SubscriptionGate {
    authenticator: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for SubscriptionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGate").finish()
    }
}

impl SubscriptionGate {
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Days remaining for a username; unknown users have no expiry.
    #[must_use]
    pub fn days_remaining_for(&self, username: &str) -> i64 {
        let expiry = self
            .authenticator
            .lookup(username)
            .and_then(|account| account.expiry());
        days_remaining(expiry)
    }

    /// Fail-closed: lapsed and never-set are both expired.
    #[must_use]
    pub fn is_expired(&self, username: &str) -> bool {
        matches!(self.days_remaining_for(username), 0 | NO_EXPIRY)
    }

    /// Self-service status, answerable even when expired.
    #[must_use]
    pub fn status(&self, username: &str) -> SubscriptionStatus {
        let account = self.authenticator.lookup(username);
        let parsed = account.as_ref().and_then(crate::models::UserAccount::expiry);

        SubscriptionStatus {
            username: username.to_string(),
            expires_at: account.and_then(|a| a.expires_at),
            days_remaining: days_remaining(parsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_absent_expiry_is_sentinel() {
        assert_eq!(days_remaining(None), NO_EXPIRY);
    }

    #[test]
    fn test_past_expiry_is_zero() {
        let past = Utc::now() - Duration::days(10);
        assert_eq!(days_remaining(Some(past)), 0);
    }

    #[test]
    fn test_future_expiry_rounds_up() {
        let in_half_a_day = Utc::now() + Duration::hours(12);
        assert_eq!(days_remaining(Some(in_half_a_day)), 1);

        let in_three_days = Utc::now() + Duration::days(3) + Duration::hours(1);
        assert_eq!(days_remaining(Some(in_three_days)), 4);
    }

    #[test]
    fn test_moments_ago_still_zero() {
        let just_lapsed = Utc::now() - Duration::seconds(30);
        assert_eq!(days_remaining(Some(just_lapsed)), 0);
    }

    mod gate {
        use super::*;
        use crate::models::UserAccount;

        struct FixedAccounts(Vec<UserAccount>);

        impl Authenticator for FixedAccounts {
            fn lookup(&self, username: &str) -> Option<UserAccount> {
                self.0.iter().find(|u| u.username == username).cloned()
            }

            fn verify(&self, _username: &str, _password: &str) -> Option<UserAccount> {
                None
            }
        }

        fn gate() -> SubscriptionGate {
            let future = (Utc::now() + Duration::days(30)).to_rfc3339();
            let past = (Utc::now() - Duration::days(1)).to_rfc3339();
            SubscriptionGate::new(Arc::new(FixedAccounts(vec![
                UserAccount {
                    username: "vigente".to_string(),
                    name: "Vigente".to_string(),
                    registered_at: None,
                    expires_at: Some(future),
                },
                UserAccount {
                    username: "vencido".to_string(),
                    name: "Vencido".to_string(),
                    registered_at: None,
                    expires_at: Some(past),
                },
                UserAccount {
                    username: "sin-expiracion".to_string(),
                    name: "Sin".to_string(),
                    registered_at: None,
                    expires_at: None,
                },
                UserAccount {
                    username: "fecha-rota".to_string(),
                    name: "Rota".to_string(),
                    registered_at: None,
                    expires_at: Some("not-a-date".to_string()),
                },
            ])))
        }

        #[test]
        fn test_gate_fail_closed() {
            let gate = gate();

            assert!(!gate.is_expired("vigente"));
            assert!(gate.is_expired("vencido"));
            assert!(gate.is_expired("sin-expiracion"));
            assert!(gate.is_expired("fecha-rota"));
            assert!(gate.is_expired("desconocido"));
        }

        #[test]
        fn test_status_always_answerable() {
            let gate = gate();

            let status = gate.status("vencido");
            assert_eq!(status.days_remaining, 0);
            assert!(status.expires_at.is_some());

            let status = gate.status("sin-expiracion");
            assert_eq!(status.days_remaining, NO_EXPIRY);
            assert!(status.expires_at.is_none());
        }
    }
}
