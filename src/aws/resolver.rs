use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_SESSION_DURATION_SECONDS, ENV_CHAIN_ROLE_ARN, ENV_PROFILE};
use crate::error::{AuthError, ConfigError, ResolveError};
use crate::mfa::{TerminalPrompt, TokenPrompt};

use super::sts::{
    AssumeRoleRequest, IdentityVerifier, MfaChallenge, RoleAssumer, Sts, unique_session_name,
};
use super::{
    CachedSession, CallerIdentity, CredentialContext, CredentialStore, Profile, ProfileKind,
    now_millis,
};

/// What this invocation asks for, lifted out of the environment by the CLI
/// layer so the resolver itself stays environment-free.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Named profile to resolve; `None` uses the ambient context
    pub profile: Option<String>,
    /// Role ARN for an extra hop on top of the primary resolution
    pub chain_role_arn: Option<String>,
}

impl ResolveRequest {
    pub fn from_env() -> Self {
        Self {
            profile: env::var(ENV_PROFILE).ok().filter(|v| !v.is_empty()),
            chain_role_arn: env::var(ENV_CHAIN_ROLE_ARN).ok().filter(|v| !v.is_empty()),
        }
    }
}

/// A successful resolution: the verified principal, and the credential
/// context to merge into subprocess environments. `context` is `None` when
/// the ambient environment was used as-is and should be inherited untouched.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub identity: CallerIdentity,
    pub context: Option<CredentialContext>,
}

/// Decides, per invocation, which credential set to use: the ambient
/// context, a cached session, a profile's long-term keys, or a freshly
/// assumed role — optionally followed by one chained hop.
pub struct CredentialResolver<V, A, P> {
    store: CredentialStore,
    verifier: V,
    assumer: A,
    mfa: P,
}

impl<V, A, P> CredentialResolver<V, A, P>
where
    V: IdentityVerifier,
    A: RoleAssumer,
    P: TokenPrompt,
{
    pub fn new(store: CredentialStore, verifier: V, assumer: A, mfa: P) -> Self {
        Self {
            store,
            verifier,
            assumer,
            mfa,
        }
    }

    pub async fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError> {
        match &request.profile {
            None => self.resolve_ambient(request.chain_role_arn.as_deref()).await,
            Some(name) => {
                self.resolve_profile(name, request.chain_role_arn.as_deref())
                    .await
            }
        }
    }

    /// No profile selected: the ambient context is all there is
    async fn resolve_ambient(&self, chain: Option<&str>) -> Result<Resolution, ResolveError> {
        let identity = self
            .verifier
            .verify_ambient()
            .await
            .map_err(|cause| AuthError::AmbientInvalid { cause })?;

        info!("Authenticated as {}", identity.arn);

        match chain {
            None => Ok(Resolution {
                identity,
                context: None,
            }),
            Some(role_arn) => self.chain_hop(None, "the ambient context", role_arn).await,
        }
    }

    async fn resolve_profile(
        &self,
        name: &str,
        chain: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let profiles = self.store.load_profiles()?;
        let profile = profiles
            .get(name)
            .ok_or_else(|| ConfigError::MissingProfile(name.to_string()))?;

        // The cache slot is keyed by the full resolution target, so a hit
        // short-circuits the chain hop as well.
        let target = chain.unwrap_or(name);

        if let Some(cached) = self.store.load_cache().await {
            let now = now_millis();
            if cached.is_usable_for(target, now) {
                let context = cached.context();
                match self.verifier.verify(&context).await {
                    Ok(identity) => {
                        info!(
                            "Resumed session for [{}]; valid for {} more minutes",
                            target,
                            cached.minutes_remaining(now)
                        );
                        return Ok(Resolution {
                            identity,
                            context: Some(context),
                        });
                    }
                    Err(e) => {
                        warn!("Cached session failed verification, discarding: {}", e);
                        self.store.delete_cache().await?;
                    }
                }
            } else if cached.profile == target {
                info!(
                    "Cached session expires in {} minutes; skipping",
                    cached.minutes_remaining(now)
                );
            } else {
                debug!(
                    "Cached session is for [{}], not [{}]; ignoring",
                    cached.profile, target
                );
            }
        }

        let (context, identity) = match &profile.kind {
            ProfileKind::DirectKeys {
                access_key_id,
                secret_access_key,
            } => self.resolve_direct(name, access_key_id, secret_access_key).await?,
            ProfileKind::AssumedRole {
                role_arn,
                source_profile,
                mfa_serial,
                duration_seconds,
            } => {
                self.resolve_role(
                    &profiles,
                    name,
                    role_arn,
                    source_profile,
                    mfa_serial.as_deref(),
                    *duration_seconds,
                )
                .await?
            }
        };

        match chain {
            None => Ok(Resolution {
                identity,
                context: Some(context),
            }),
            Some(role_arn) => {
                self.chain_hop(Some(&context), &format!("profile [{name}]"), role_arn)
                    .await
            }
        }
    }

    /// Long-term keys used directly. Nothing to cache, so a leftover cached
    /// session is removed once the keys verify.
    async fn resolve_direct(
        &self,
        name: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<(CredentialContext, CallerIdentity), ResolveError> {
        let context = CredentialContext::from_keys(access_key_id, secret_access_key);

        let identity =
            self.verifier
                .verify(&context)
                .await
                .map_err(|cause| AuthError::LongTermRejected {
                    profile: name.to_string(),
                    cause,
                })?;

        info!("Authenticated as {}", identity.arn);
        self.store.delete_cache().await?;

        Ok((context, identity))
    }

    async fn resolve_role(
        &self,
        profiles: &HashMap<String, Profile>,
        name: &str,
        role_arn: &str,
        source_profile: &str,
        mfa_serial: Option<&str>,
        duration_seconds: Option<i32>,
    ) -> Result<(CredentialContext, CallerIdentity), ResolveError> {
        let (source_key, source_secret) = profiles
            .get(source_profile)
            .and_then(|p| p.long_term_keys())
            .ok_or_else(|| ConfigError::InvalidSourceProfile {
                profile: name.to_string(),
                source_profile: source_profile.to_string(),
            })?;

        let source_context = CredentialContext::from_keys(source_key, source_secret);

        let mfa = match mfa_serial {
            Some(serial) => {
                let token = self
                    .mfa
                    .prompt(serial)
                    .map_err(|cause| ResolveError::InteractiveAbort { cause })?;
                Some(MfaChallenge {
                    serial: serial.to_string(),
                    token,
                })
            }
            None => None,
        };

        let request = AssumeRoleRequest {
            role_arn: role_arn.to_string(),
            session_name: unique_session_name(),
            duration_seconds: duration_seconds.unwrap_or(DEFAULT_SESSION_DURATION_SECONDS),
            mfa,
        };

        let session = self
            .assumer
            .assume(Some(&source_context), &request)
            .await
            .map_err(|cause| AuthError::AssumeRoleFailed {
                role_arn: role_arn.to_string(),
                via: format!("profile [{source_profile}]"),
                cause,
            })?;

        let context = session.context();
        let identity = self
            .verifier
            .verify(&context)
            .await
            .map_err(|cause| AuthError::SessionRejected { cause })?;

        info!("Assumed role [{}] as {}", role_arn, identity.arn);
        self.store
            .save_cache(&CachedSession::from_session(&session, name))
            .await?;

        Ok((context, identity))
    }

    /// One extra assumption on top of an already-resolved context. The
    /// result replaces the cache slot, keyed by the chain target ARN.
    async fn chain_hop(
        &self,
        source: Option<&CredentialContext>,
        source_desc: &str,
        role_arn: &str,
    ) -> Result<Resolution, ResolveError> {
        let request = AssumeRoleRequest {
            role_arn: role_arn.to_string(),
            session_name: unique_session_name(),
            duration_seconds: DEFAULT_SESSION_DURATION_SECONDS,
            mfa: None,
        };

        let session = self
            .assumer
            .assume(source, &request)
            .await
            .map_err(|cause| AuthError::AssumeRoleFailed {
                role_arn: role_arn.to_string(),
                via: source_desc.to_string(),
                cause,
            })?;

        let context = session.context();
        let identity = self
            .verifier
            .verify(&context)
            .await
            .map_err(|cause| AuthError::SessionRejected { cause })?;

        info!("Assumed chained role [{}] as {}", role_arn, identity.arn);
        self.store
            .save_cache(&CachedSession::from_session(&session, role_arn))
            .await?;

        Ok(Resolution {
            identity,
            context: Some(context),
        })
    }
}

/// Resolve with the real components against the per-user default paths,
/// reading the request from the environment.
pub async fn resolve_from_env() -> Result<Resolution> {
    let store = CredentialStore::from_env()?;
    let sts = Sts::from_env();
    let resolver = CredentialResolver::new(store, sts.clone(), sts, TerminalPrompt);

    let resolution = resolver
        .resolve(&ResolveRequest::from_env())
        .await
        .context("Credential resolution failed")?;

    Ok(resolution)
}
