use anyhow::Result;
use clap::Args;

use crate::aws::resolver::resolve_from_env;

/// Resolves credentials and reports the verified identity without running
/// anything else. Useful for priming the session cache ahead of a long
/// apply, or for checking which principal a profile resolves to.
#[derive(Debug, Clone, Args)]
pub struct AuthCommand {}

impl AuthCommand {
    pub async fn execute(self) -> Result<()> {
        let resolution = resolve_from_env().await?;

        println!("Authenticated as {}", resolution.identity.arn);
        println!("Account: {}", resolution.identity.account);

        Ok(())
    }
}
