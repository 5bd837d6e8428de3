use std::{env, path::PathBuf};

use dirs;

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Session cache file name (lives next to the shared credentials file)
pub const SESSION_CACHE_FILE_NAME: &str = "canto_cache.json";

/// Environment variable selecting the profile to resolve
pub const ENV_PROFILE: &str = "AWS_PROFILE";

/// Environment variable requesting an extra role hop after primary resolution
pub const ENV_CHAIN_ROLE_ARN: &str = "CANTO_ASSUME_ROLE_CHAIN_ARN";

/// Environment variable overriding the session cache file path
pub const ENV_SESSION_CACHE_FILE: &str = "CANTO_SESSION_CACHE_FILE";

/// Environment variable overriding the terraform binary path
pub const ENV_TERRAFORM_BIN: &str = "CANTO_TERRAFORM_BIN";

/// Ambient credential variables scrubbed before exporting a resolved context
pub const AMBIENT_CREDENTIAL_VARS: &[&str] = &[
    "AWS_PROFILE",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
];

/// A cached session closer than this to expiry is not reused
pub const SESSION_REUSE_MARGIN_MS: i64 = 45 * 60 * 1000;

/// Default AssumeRole duration when the profile does not set one
pub const DEFAULT_SESSION_DURATION_SECONDS: i32 = 3600;

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Prefix for generated role session names
pub const SESSION_NAME_PREFIX: &str = "canto_assumerole";

/// Default directory rendered configuration is written into
pub const DEFAULT_RENDER_PATH: &str = "./render";

/// Prefix of the per-account bootstrap state bucket
pub const BACKEND_BUCKET_PREFIX: &str = "canto";

/// Tag marking the bootstrap state bucket
pub const BACKEND_BUCKET_TAG_KEY: &str = "canto-backend";
pub const BACKEND_BUCKET_TAG_VALUE: &str = "true";

/// Region for provider clients: AWS_REGION, then AWS_DEFAULT_REGION, then
/// the STS default
pub fn get_default_region() -> String {
    env::var("AWS_REGION")
        .or_else(|_| env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| DEFAULT_AWS_REGION.to_string())
}

/// Get the AWS shared credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CREDENTIALS_FILE_NAME))
}

/// Get the session cache file path
/// Respects CANTO_SESSION_CACHE_FILE environment variable if set
pub fn get_session_cache_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(ENV_SESSION_CACHE_FILE) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(SESSION_CACHE_FILE_NAME))
}
