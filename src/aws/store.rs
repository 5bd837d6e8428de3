use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ini::Ini;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::constants::{self, SESSION_REUSE_MARGIN_MS};
use crate::error::ConfigError;

use super::{CredentialContext, Profile, SessionCredentials};

/// A persisted temporary session, reusable by later invocations until it
/// comes within the reuse margin of its expiry. One slot per user; the
/// `profile` field holds the resolution target it was obtained for — a
/// profile name, or a chain role ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSession {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Absolute expiry, epoch milliseconds
    pub expire_time: i64,
    /// Kept for file-format compatibility; `expire_time` is authoritative
    pub expired: bool,
    pub profile: String,
}

impl CachedSession {
    pub fn from_session(session: &SessionCredentials, target: &str) -> Self {
        Self {
            access_key_id: session.access_key_id.clone(),
            secret_access_key: session.secret_access_key.clone(),
            session_token: session.session_token.clone(),
            expire_time: session.expire_time,
            expired: false,
            profile: target.to_string(),
        }
    }

    /// Whether this session can stand in for a resolution of `target` at
    /// `now_ms`. A session at exactly the margin boundary is unusable.
    pub fn is_usable_for(&self, target: &str, now_ms: i64) -> bool {
        self.profile == target && self.expire_time > now_ms + SESSION_REUSE_MARGIN_MS
    }

    /// Whole minutes until expiry; negative once expired
    pub fn minutes_remaining(&self, now_ms: i64) -> i64 {
        (self.expire_time - now_ms) / 60_000
    }

    pub fn context(&self) -> CredentialContext {
        CredentialContext {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: Some(self.session_token.clone()),
            region: None,
        }
    }
}

/// Owns the on-disk credential state: the long-term profile definitions in
/// the shared credentials file, and the single-slot session cache.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials_path: PathBuf,
    cache_path: PathBuf,
}

impl CredentialStore {
    pub fn new(credentials_path: PathBuf, cache_path: PathBuf) -> Self {
        Self {
            credentials_path,
            cache_path,
        }
    }

    /// Store rooted at the per-user default paths (env overrides respected)
    pub fn from_env() -> Result<Self> {
        let credentials_path = constants::get_aws_credentials_path()
            .context("Failed to determine AWS credentials path")?;
        let cache_path = constants::get_session_cache_path()
            .context("Failed to determine session cache path")?;

        Ok(Self::new(credentials_path, cache_path))
    }

    /// Parse every usable profile out of the shared credentials file.
    /// Sections without a key pair or a role pointer are skipped.
    pub fn load_profiles(&self) -> Result<HashMap<String, Profile>, ConfigError> {
        if !self.credentials_path.exists() {
            return Err(ConfigError::MissingCredentialsFile {
                path: self.credentials_path.clone(),
            });
        }

        let ini = Ini::load_from_file(&self.credentials_path).map_err(|cause| {
            ConfigError::UnreadableCredentialsFile {
                path: self.credentials_path.clone(),
                cause,
            }
        })?;

        let mut profiles = HashMap::new();

        for (section, properties) in ini.iter() {
            let Some(name) = section else {
                continue;
            };

            match Profile::from_section(name, properties) {
                Some(profile) => {
                    profiles.insert(name.to_string(), profile);
                }
                None => {
                    warn!(
                        "Ignoring profile [{}]: neither long-term keys nor a role to assume",
                        name
                    );
                }
            }
        }

        Ok(profiles)
    }

    /// Load the cached session if one is present and parseable. A missing or
    /// corrupt cache is not an error; resolution falls through to a fresh
    /// credential exchange.
    pub async fn load_cache(&self) -> Option<CachedSession> {
        let raw = match fs::read_to_string(&self.cache_path).await {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No session cache at {}", self.cache_path.display());
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Discarding unparseable session cache: {}", e);
                None
            }
        }
    }

    /// Persist a session, overwriting any prior cache content
    pub async fn save_cache(&self, session: &CachedSession) -> Result<(), ConfigError> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let raw = serde_json::to_string(session).map_err(std::io::Error::other)?;
        fs::write(&self.cache_path, raw).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = fs::metadata(&self.cache_path).await?;
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o600);
            fs::set_permissions(&self.cache_path, permissions).await?;
        }

        debug!("Session cache written for [{}]", session.profile);
        Ok(())
    }

    /// Remove the cached session. Succeeds when no cache exists.
    pub async fn delete_cache(&self) -> Result<(), ConfigError> {
        match fs::remove_file(&self.cache_path).await {
            Ok(()) => {
                debug!("Session cache removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
