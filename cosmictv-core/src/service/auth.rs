//! Account lookup and bearer tokens.
//!
//! Credential storage and hashing are an external concern; the core only
//! needs "given a username and password, is this a known account" and
//! "given a token, whose is it". The default implementation reads a
//! `users.json` file and compares plaintext passwords — records carrying
//! only a `passwordHash` never match here, by design.
//!
//! Tokens are opaque bearer strings from which the username is
//! deterministically recoverable without any server-side session state:
//! `base64url(username) + "." + nanoid(16)`.

use std::path::PathBuf;
use std::time::SystemTime;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use nanoid::nanoid;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::UserAccount;
use crate::{Error, Result};

/// Read-only account source.
pub trait Authenticator: Send + Sync {
    /// Find an account by username.
    fn lookup(&self, username: &str) -> Option<UserAccount>;

    /// Check credentials; `Some` with the account on success.
    fn verify(&self, username: &str, password: &str) -> Option<UserAccount>;
}

/// Mint an opaque bearer token for a username.
#[must_use]
pub fn issue_token(username: &str) -> String {
    format!("{}.{}", URL_SAFE_NO_PAD.encode(username), nanoid!(16))
}

/// Recover the username a token was minted for.
pub fn username_from_token(token: &str) -> Result<String> {
    let encoded = token
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Authentication("malformed token".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| Error::Authentication("malformed token".to_string()))?;
    String::from_utf8(bytes).map_err(|_| Error::Authentication("malformed token".to_string()))
}

/// One record of the users.json account file.
///
/// Unknown fields are tolerated so external tooling can decorate the file
/// without breaking us.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    username: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    registered_at: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

impl UserRecord {
    fn account(&self) -> UserAccount {
        UserAccount {
            username: self.username.clone(),
            name: self.name.clone().unwrap_or_else(|| self.username.clone()),
            registered_at: self.registered_at.clone(),
            expires_at: self.expires_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    users: Vec<UserRecord>,
}

#[derive(Debug, Default)]
struct Cached {
    mtime: Option<SystemTime>,
    records: Vec<UserRecord>,
    loaded: bool,
}

/// `users.json`-backed authenticator with mtime-based reload.
pub struct FileAuthenticator {
    path: PathBuf,
    cache: RwLock<Cached>,
}

impl std::fmt::Debug for FileAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAuthenticator")
            .field("path", &self.path)
            .finish()
    }
}

impl FileAuthenticator {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(Cached::default()),
        }
    }

    /// Built-in fallback when no account file exists.
    fn default_records() -> Vec<UserRecord> {
        vec![UserRecord {
            username: "admin".to_string(),
            password: Some("1234".to_string()),
            password_hash: None,
            name: Some("Admin".to_string()),
            registered_at: None,
            expires_at: None,
        }]
    }

    fn read_records(&self) -> Vec<UserRecord> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<UsersFile>(&raw) {
                Ok(file) => file.users,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        "users file is not valid JSON, using default accounts: {e}"
                    );
                    Self::default_records()
                }
            },
            Err(_) => Self::default_records(),
        }
    }

    /// Run `f` over the current records, reloading if the file changed.
    fn with_records<T>(&self, f: impl FnOnce(&[UserRecord]) -> T) -> T {
        let mtime = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok();

        {
            let cache = self.cache.read();
            if cache.loaded && cache.mtime == mtime {
                return f(&cache.records);
            }
        }

        let records = self.read_records();
        let mut cache = self.cache.write();
        cache.records = records;
        cache.mtime = mtime;
        cache.loaded = true;
        f(&cache.records)
    }
}

impl Authenticator for FileAuthenticator {
    fn lookup(&self, username: &str) -> Option<UserAccount> {
        self.with_records(|records| {
            records
                .iter()
                .find(|r| r.username == username)
                .map(UserRecord::account)
        })
    }

    fn verify(&self, username: &str, password: &str) -> Option<UserAccount> {
        self.with_records(|records| {
            let record = records.iter().find(|r| r.username == username)?;

            if record.password_hash.is_some() && record.password.is_none() {
                // Hashed credentials are verified by the external
                // authenticator, not here.
                return None;
            }

            match &record.password {
                Some(stored) if stored == password => Some(record.account()),
                _ => None,
            }
        })
    }
}
