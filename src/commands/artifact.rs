use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use crate::aws::resolver::resolve_from_env;
use crate::backend::Backend;

/// Reads and writes project artifacts in the bootstrap bucket
#[derive(Debug, Clone, Args)]
pub struct ArtifactCommand {
    #[arg(short = 'p', long, help = "Project the artifact belongs to")]
    pub project: String,

    #[command(subcommand)]
    pub action: ArtifactAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ArtifactAction {
    #[command(about = "Fetch an artifact and write it to a file or stdout")]
    Get {
        name: String,
        #[arg(short = 'o', long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },
    #[command(about = "Upload a file as a project artifact")]
    Put { name: String, file: PathBuf },
}

impl ArtifactCommand {
    pub async fn execute(self) -> Result<()> {
        let resolution = resolve_from_env().await?;
        let backend = Backend::locate(&self.project, resolution.context.as_ref()).await?;

        match self.action {
            ArtifactAction::Get { name, output } => {
                let Some(content) = backend.get_artifact(&name).await? else {
                    bail!("Artifact {name} does not exist for project {}", self.project);
                };

                match output {
                    Some(path) => {
                        std::fs::write(&path, content)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!("Wrote {}", path.display());
                    }
                    None => {
                        use std::io::Write;
                        std::io::stdout()
                            .write_all(&content)
                            .context("Failed to write artifact to stdout")?;
                    }
                }
            }
            ArtifactAction::Put { name, file } => {
                let content = std::fs::read(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                backend.put_artifact(&name, content).await?;
                println!("Stored {name} for project {}", self.project);
            }
        }

        Ok(())
    }
}
