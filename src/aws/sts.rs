use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::Client as StsClient;
use aws_sdk_sts::config::Credentials as StsCredentials;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::SESSION_NAME_PREFIX;

use super::{CallerIdentity, CredentialContext, SessionCredentials};

/// One read-only identity lookup per call. No internal retries: retry
/// policy belongs to the caller, and the resolver never retries a failed
/// verification.
#[async_trait]
pub trait IdentityVerifier {
    async fn verify(&self, context: &CredentialContext) -> Result<CallerIdentity>;

    /// Verify whatever the default provider chain resolves from the
    /// inherited process environment.
    async fn verify_ambient(&self) -> Result<CallerIdentity>;
}

/// A single role-assumption exchange
#[async_trait]
pub trait RoleAssumer {
    /// `source: None` assumes from the ambient provider chain
    async fn assume(
        &self,
        source: Option<&CredentialContext>,
        request: &AssumeRoleRequest,
    ) -> Result<SessionCredentials>;
}

#[derive(Debug, Clone)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
    pub mfa: Option<MfaChallenge>,
}

#[derive(Debug, Clone)]
pub struct MfaChallenge {
    pub serial: String,
    pub token: String,
}

/// A unique role session name, always under the 64-character STS limit
pub fn unique_session_name() -> String {
    format!("{}_{}", SESSION_NAME_PREFIX, Uuid::new_v4().simple())
}

/// STS-backed implementation of both credential exchanges
#[derive(Debug, Clone)]
pub struct Sts {
    region: String,
}

impl Sts {
    pub fn new(region: String) -> Self {
        Self { region }
    }

    /// Region from the process environment, falling back to the STS default
    pub fn from_env() -> Self {
        Self::new(crate::constants::get_default_region())
    }

    /// Client bound to an explicit credential context. Ambient environment
    /// state never reaches these clients.
    fn client_for(&self, context: &CredentialContext) -> StsClient {
        let credentials = StsCredentials::new(
            context.access_key_id.clone(),
            context.secret_access_key.clone(),
            context.session_token.clone(),
            None,
            "canto",
        );

        let region = context.region.clone().unwrap_or_else(|| self.region.clone());

        let config = aws_sdk_sts::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .build();

        StsClient::from_conf(config)
    }

    /// Client for the ambient provider chain, with the default-region
    /// fallback applied when nothing configures one
    async fn ambient_client(&self) -> StsClient {
        let loaded = aws_config::defaults(BehaviorVersion::latest()).load().await;

        match loaded.region() {
            Some(region) => {
                debug!("Using ambient region: {}", region);
                StsClient::new(&loaded)
            }
            None => {
                debug!("No region configured, using {} for STS", self.region);
                let loaded = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(self.region.clone()))
                    .load()
                    .await;
                StsClient::new(&loaded)
            }
        }
    }

    async fn caller_identity(client: &StsClient) -> Result<CallerIdentity> {
        let output = client
            .get_caller_identity()
            .send()
            .await
            .context("GetCallerIdentity call failed")?;

        Ok(CallerIdentity {
            account: output.account().unwrap_or_default().to_string(),
            arn: output.arn().unwrap_or_default().to_string(),
            user_id: output.user_id().unwrap_or_default().to_string(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for Sts {
    async fn verify(&self, context: &CredentialContext) -> Result<CallerIdentity> {
        Self::caller_identity(&self.client_for(context)).await
    }

    async fn verify_ambient(&self) -> Result<CallerIdentity> {
        Self::caller_identity(&self.ambient_client().await).await
    }
}

#[async_trait]
impl RoleAssumer for Sts {
    async fn assume(
        &self,
        source: Option<&CredentialContext>,
        request: &AssumeRoleRequest,
    ) -> Result<SessionCredentials> {
        info!("Calling AWS STS AssumeRole");
        debug!("Role ARN: {}", request.role_arn);
        debug!("Duration: {} seconds", request.duration_seconds);

        let client = match source {
            Some(context) => self.client_for(context),
            None => self.ambient_client().await,
        };

        let mut call = client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_seconds);

        if let Some(mfa) = &request.mfa {
            call = call.serial_number(&mfa.serial).token_code(&mfa.token);
        }

        let response = call.send().await.context("AssumeRole call failed")?;

        let sts_creds = response
            .credentials()
            .context("AWS STS returned no credentials")?;

        let expire_time = sts_creds
            .expiration()
            .to_millis()
            .context("AWS STS returned an unrepresentable expiry")?;

        info!("Successfully assumed role [{}]", request.role_arn);

        Ok(SessionCredentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expire_time,
        })
    }
}
