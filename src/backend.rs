use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Credentials as S3Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    PublicAccessBlockConfiguration, Tag, Tagging, VersioningConfiguration,
};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::aws::CredentialContext;
use crate::constants::{
    self, BACKEND_BUCKET_PREFIX, BACKEND_BUCKET_TAG_KEY, BACKEND_BUCKET_TAG_VALUE,
    DEFAULT_AWS_REGION,
};

/// The per-account bootstrap bucket: holds Terraform state and project
/// artifacts. At most one exists per account; more than one is a fatal
/// misconfiguration.
#[derive(Debug, Clone)]
pub struct Backend {
    client: S3Client,
    bucket: String,
    region: String,
    project: String,
}

impl Backend {
    /// Locate the bootstrap bucket, creating and configuring one when the
    /// account has none yet.
    pub async fn bootstrap(project: &str, context: Option<&CredentialContext>) -> Result<Self> {
        Self::open(project, context, true).await
    }

    /// Locate the existing bootstrap bucket; fails when the account has
    /// none.
    pub async fn locate(project: &str, context: Option<&CredentialContext>) -> Result<Self> {
        Self::open(project, context, false).await
    }

    async fn open(
        project: &str,
        context: Option<&CredentialContext>,
        create_if_missing: bool,
    ) -> Result<Self> {
        let default_region = constants::get_default_region();
        let client = client_for(context, &default_region).await;

        let bucket = match find_backend_bucket(&client).await? {
            Some(name) => {
                info!("Using bootstrap bucket {}", name);
                name
            }
            None if create_if_missing => create_backend_bucket(&client, &default_region).await?,
            None => bail!(
                "No bootstrap bucket exists in this account. Apply a project with --project first."
            ),
        };

        let location = client
            .get_bucket_location()
            .bucket(&bucket)
            .send()
            .await
            .context("Failed to determine bootstrap bucket location")?;

        let region = location
            .location_constraint()
            .map(|constraint| constraint.as_str().to_string())
            .filter(|constraint| !constraint.is_empty())
            .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());

        // object operations go through a client bound to the bucket's region
        let client = if region == default_region {
            client
        } else {
            client_for(context, &region).await
        };

        Ok(Self {
            client,
            bucket,
            region,
            project: project.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The Terraform backend block pointing state at this bucket
    pub fn backend_block(&self) -> Value {
        json!({
            "terraform": {
                "backend": {
                    "s3": {
                        "bucket": &self.bucket,
                        "key": format!("{}/{}/terraform.tfstate", BACKEND_BUCKET_PREFIX, self.project),
                        "region": &self.region,
                    }
                }
            }
        })
    }

    /// Fetch a project artifact; `None` when it does not exist
    pub async fn get_artifact(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let key = self.artifact_key(name);
        debug!("Fetching artifact s3://{}/{}", self.bucket, key);

        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => {
                let body = output
                    .body
                    .collect()
                    .await
                    .with_context(|| format!("Failed to read artifact {name}"))?;
                Ok(Some(body.to_vec()))
            }
            Err(e) => {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    return Ok(None);
                }
                Err(e).with_context(|| format!("Failed to fetch artifact {name}"))
            }
        }
    }

    /// Store a project artifact, overwriting any existing content
    pub async fn put_artifact(&self, name: &str, content: Vec<u8>) -> Result<()> {
        let key = self.artifact_key(name);
        debug!("Storing artifact s3://{}/{}", self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(content))
            .send()
            .await
            .with_context(|| format!("Failed to store artifact {name}"))?;

        Ok(())
    }

    fn artifact_key(&self, name: &str) -> String {
        format!("{}/{}/artifacts/{}", BACKEND_BUCKET_PREFIX, self.project, name)
    }
}

async fn client_for(context: Option<&CredentialContext>, region: &str) -> S3Client {
    match context {
        Some(context) => {
            let credentials = S3Credentials::new(
                context.access_key_id.clone(),
                context.secret_access_key.clone(),
                context.session_token.clone(),
                None,
                "canto",
            );

            let region = context.region.clone().unwrap_or_else(|| region.to_string());

            let config = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(region))
                .credentials_provider(credentials)
                .build();

            S3Client::from_conf(config)
        }
        None => {
            let loaded = aws_config::defaults(BehaviorVersion::latest()).load().await;
            match loaded.region() {
                Some(_) => S3Client::new(&loaded),
                None => {
                    let loaded = aws_config::defaults(BehaviorVersion::latest())
                        .region(Region::new(region.to_string()))
                        .load()
                        .await;
                    S3Client::new(&loaded)
                }
            }
        }
    }
}

async fn find_backend_bucket(client: &S3Client) -> Result<Option<String>> {
    let listing = client
        .list_buckets()
        .send()
        .await
        .context("Failed to list buckets")?;

    let mut candidates: Vec<String> = listing
        .buckets()
        .iter()
        .filter_map(|bucket| bucket.name())
        .filter(|name| is_backend_bucket_name(name))
        .map(str::to_string)
        .collect();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(Some(candidates.remove(0))),
        _ => bail!(
            "More than one bootstrap bucket exists in this account. Fix this before continuing."
        ),
    }
}

/// Create the bootstrap bucket: tagged, versioned, public access blocked
async fn create_backend_bucket(client: &S3Client, region: &str) -> Result<String> {
    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let name = generate_bucket_name(now_secs);

    let mut create = client.create_bucket().bucket(&name);

    if region != DEFAULT_AWS_REGION {
        create = create.create_bucket_configuration(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build(),
        );
    }

    create
        .send()
        .await
        .with_context(|| format!("Unable to create bucket {name}"))?;

    let tag = Tag::builder()
        .key(BACKEND_BUCKET_TAG_KEY)
        .value(BACKEND_BUCKET_TAG_VALUE)
        .build()
        .context("Failed to build bucket tag")?;

    client
        .put_bucket_tagging()
        .bucket(&name)
        .tagging(
            Tagging::builder()
                .tag_set(tag)
                .build()
                .context("Failed to build bucket tagging")?,
        )
        .send()
        .await
        .with_context(|| format!("Unable to tag bucket {name}"))?;

    client
        .put_bucket_versioning()
        .bucket(&name)
        .versioning_configuration(
            VersioningConfiguration::builder()
                .status(BucketVersioningStatus::Enabled)
                .build(),
        )
        .send()
        .await
        .with_context(|| format!("Unable to enable versioning on bucket {name}"))?;

    client
        .put_public_access_block()
        .bucket(&name)
        .public_access_block_configuration(
            PublicAccessBlockConfiguration::builder()
                .block_public_acls(true)
                .block_public_policy(true)
                .ignore_public_acls(true)
                .restrict_public_buckets(true)
                .build(),
        )
        .send()
        .await
        .with_context(|| format!("Unable to block public access on bucket {name}"))?;

    info!("Created bootstrap bucket {}", name);
    Ok(name)
}

fn generate_bucket_name(now_secs: u64) -> String {
    format!(
        "{}-{}-{}",
        BACKEND_BUCKET_PREFIX,
        random_letters(8),
        now_secs
    )
}

/// `canto-<lowercase letters>-<10-digit epoch>`
fn is_backend_bucket_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(BACKEND_BUCKET_PREFIX) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix('-') else {
        return false;
    };
    let Some((letters, timestamp)) = rest.rsplit_once('-') else {
        return false;
    };

    letters.chars().all(|c| c.is_ascii_lowercase())
        && timestamp.len() == 10
        && timestamp.chars().all(|c| c.is_ascii_digit())
}

fn random_letters(count: usize) -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(count)
        .map(|b| char::from(b'a' + (b % 26)))
        .collect()
}
