use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::aws::resolver::resolve_from_env;
use crate::terraform::Terraform;

/// Destroys whatever the rendered configuration in the render directory
/// currently describes.
#[derive(Debug, Clone, Args)]
pub struct DestroyCommand {
    #[arg(short = 'y', long, help = "Skip the destroy confirmation")]
    pub auto_approve: bool,

    #[arg(short = 's', long, help = "Skip provider initialization")]
    pub skip_init: bool,
}

impl DestroyCommand {
    pub async fn execute(self, render_path: &Path) -> Result<()> {
        let resolution = resolve_from_env().await?;

        let terraform = Terraform::from_env(render_path);

        if !self.skip_init {
            terraform.init(resolution.context.as_ref())?;
        }

        terraform.destroy(self.auto_approve, resolution.context.as_ref())?;

        println!("Successfully destroyed");
        Ok(())
    }
}
