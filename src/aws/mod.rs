use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod profile;
pub mod resolver;
pub mod store;
pub mod sts;

pub use profile::{Profile, ProfileKind};
pub use resolver::{CredentialResolver, ResolveRequest, Resolution};
pub use store::{CachedSession, CredentialStore};

/// The active credential set. Threaded through the resolver as an explicit
/// value; exported to subprocesses only via [`CredentialContext::env_vars`].
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialContext {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: Option<String>,
}

impl CredentialContext {
    pub fn from_keys(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: None,
            region: None,
        }
    }

    /// Environment representation handed to subprocess invokers. The session
    /// token is exported even when absent, so a stale inherited token can
    /// never outlive the context that replaced it.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![
            ("AWS_ACCESS_KEY_ID".to_string(), self.access_key_id.clone()),
            (
                "AWS_SECRET_ACCESS_KEY".to_string(),
                self.secret_access_key.clone(),
            ),
            (
                "AWS_SESSION_TOKEN".to_string(),
                self.session_token.clone().unwrap_or_default(),
            ),
        ];

        if let Some(region) = &self.region {
            vars.push(("AWS_DEFAULT_REGION".to_string(), region.clone()));
        }

        vars
    }
}

// The secret key and session token never appear in logs or traces.
impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// A temporary credential set returned by a role assumption, with its
/// absolute expiry in epoch milliseconds as measured against local time.
#[derive(Clone)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expire_time: i64,
}

impl SessionCredentials {
    pub fn context(&self) -> CredentialContext {
        CredentialContext {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: Some(self.session_token.clone()),
            region: None,
        }
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expire_time", &self.expire_time)
            .finish_non_exhaustive()
    }
}

/// The verified principal behind a credential context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

/// Epoch milliseconds for a point in time
pub fn epoch_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

/// Epoch milliseconds now
pub fn now_millis() -> i64 {
    epoch_millis(SystemTime::now())
}
