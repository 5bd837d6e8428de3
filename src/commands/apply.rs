use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::aws::resolver::resolve_from_env;
use crate::backend::Backend;
use crate::render::{RenderedConfig, Renderer};
use crate::terraform::Terraform;

#[derive(Debug, Clone, Args)]
pub struct ApplyCommand {
    #[arg(help = "Configuration file to evaluate")]
    pub filename: PathBuf,

    #[arg(short = 'y', long, help = "Skip the apply confirmation. Yolo.")]
    pub auto_approve: bool,

    #[arg(short = 's', long, help = "Skip provider initialization")]
    pub skip_init: bool,

    #[arg(long, help = "Skip state refresh during apply")]
    pub skip_refresh: bool,

    #[arg(
        long,
        help = "Store state in the bootstrap bucket under this project name"
    )]
    pub project: Option<String>,
}

impl ApplyCommand {
    pub async fn execute(self, render_path: &Path) -> Result<()> {
        let resolution = resolve_from_env().await?;

        info!(
            "Evaluating {} into {}",
            self.filename.display(),
            render_path.display()
        );

        let mut config = RenderedConfig::load(&self.filename)?;

        if let Some(project) = &self.project {
            let backend = Backend::bootstrap(project, resolution.context.as_ref())
                .await
                .with_context(|| format!("Failed to bootstrap project {project}"))?;
            config.insert("backend.tf.json", backend.backend_block());
        }

        Renderer::new(render_path, true).write(&config)?;

        let terraform = Terraform::from_env(render_path);

        if !self.skip_init {
            terraform.init(resolution.context.as_ref())?;
        }

        terraform.apply(
            self.auto_approve,
            self.skip_refresh,
            resolution.context.as_ref(),
        )?;

        println!("Successfully applied");
        Ok(())
    }
}
