use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems: the operator has to fix a file or a profile
/// before a resolution can succeed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "the shared credentials file {} is missing. Have you configured the AWS CLI yet?",
        path.display()
    )]
    MissingCredentialsFile { path: PathBuf },

    #[error("failed to read the shared credentials file {}: {cause}", path.display())]
    UnreadableCredentialsFile { path: PathBuf, cause: ini::Error },

    #[error("profile [{0}] is not defined in the shared credentials file")]
    MissingProfile(String),

    #[error(
        "source profile [{source_profile}] referenced by [{profile}] is missing or carries no long-term keys"
    )]
    InvalidSourceProfile { profile: String, source_profile: String },

    #[error("failed to persist the session cache: {0}")]
    CachePersist(#[from] std::io::Error),
}

/// Authentication failures: the provider rejected a credential set. Always
/// fatal to the run; nothing is retried.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no profile was specified, and the default credential context is invalid: {cause}")]
    AmbientInvalid { cause: anyhow::Error },

    #[error("long-term credentials for profile [{profile}] are invalid: {cause}")]
    LongTermRejected { profile: String, cause: anyhow::Error },

    #[error("failed to assume role {role_arn} via {via}: {cause}")]
    AssumeRoleFailed {
        role_arn: String,
        via: String,
        cause: anyhow::Error,
    },

    #[error("verification of the assumed session failed: {cause}")]
    SessionRejected { cause: anyhow::Error },
}

/// Top-level outcome of a credential resolution. The binary prints the
/// message and exits non-zero; there is no identity to fall back to.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("MFA prompt aborted: {cause}")]
    InteractiveAbort { cause: anyhow::Error },
}
