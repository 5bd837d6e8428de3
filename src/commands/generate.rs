use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::render::{RenderedConfig, Renderer};

/// Renders configuration files without touching credentials or Terraform
#[derive(Debug, Clone, Args)]
pub struct GenerateCommand {
    #[arg(help = "Configuration file to evaluate")]
    pub filename: PathBuf,
}

impl GenerateCommand {
    pub async fn execute(self, render_path: &Path) -> Result<()> {
        let config = RenderedConfig::load(&self.filename)?;
        let written = Renderer::new(render_path, true).write(&config)?;

        for path in &written {
            println!("  {}", path.display());
        }

        println!("Generated {} file(s)", written.len());
        Ok(())
    }
}
