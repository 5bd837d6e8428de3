use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::aws::resolver::resolve_from_env;
use crate::terraform::Terraform;

/// Runs provider initialization against the render directory
#[derive(Debug, Clone, Args)]
pub struct InitCommand {}

impl InitCommand {
    pub async fn execute(self, render_path: &Path) -> Result<()> {
        let resolution = resolve_from_env().await?;

        Terraform::from_env(render_path).init(resolution.context.as_ref())?;
        Ok(())
    }
}
