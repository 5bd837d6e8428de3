use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{
    ApplyCommand, ArtifactCommand, AuthCommand, DestroyCommand, GenerateCommand, InitCommand,
};
use crate::constants::DEFAULT_RENDER_PATH;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "canto",
    version,
    about = "Render declarative Terraform JSON and apply it with resolved AWS credentials",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_RENDER_PATH,
        help = "Directory rendered configuration is written into"
    )]
    pub render_path: PathBuf,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Generate a configuration and apply it")]
    Apply(ApplyCommand),
    #[command(about = "Destroy the currently rendered configuration")]
    Destroy(DestroyCommand),
    #[command(about = "Generate files from a configuration")]
    Generate(GenerateCommand),
    #[command(about = "Initialize Terraform providers in the render directory")]
    Init(InitCommand),
    #[command(about = "Resolve AWS credentials and print the verified identity")]
    Auth(AuthCommand),
    #[command(about = "Manage project artifacts in the bootstrap bucket")]
    Artifact(ArtifactCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let render_path = self.render_path;

        match self.command {
            Commands::Apply(cmd) => cmd.execute(&render_path).await,
            Commands::Destroy(cmd) => cmd.execute(&render_path).await,
            Commands::Generate(cmd) => cmd.execute(&render_path).await,
            Commands::Init(cmd) => cmd.execute(&render_path).await,
            Commands::Auth(cmd) => cmd.execute().await,
            Commands::Artifact(cmd) => cmd.execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};

    #[test]
    fn test_command_structure_validation() {
        let cmd = Cli::command();
        cmd.debug_assert();
    }

    #[test]
    fn test_apply_parsing() {
        let cli = Cli::try_parse_from(["canto", "apply", "config.json"]).unwrap();
        match cli.command {
            Commands::Apply(cmd) => {
                assert_eq!(cmd.filename, PathBuf::from("config.json"));
                assert!(!cmd.auto_approve);
                assert!(!cmd.skip_init);
                assert!(!cmd.skip_refresh);
                assert_eq!(cmd.project, None);
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "canto",
            "apply",
            "config.json",
            "-y",
            "-s",
            "--skip-refresh",
            "--project",
            "sample",
        ])
        .unwrap();

        match cli.command {
            Commands::Apply(cmd) => {
                assert!(cmd.auto_approve);
                assert!(cmd.skip_init);
                assert!(cmd.skip_refresh);
                assert_eq!(cmd.project.as_deref(), Some("sample"));
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_apply_requires_filename() {
        let result = Cli::try_parse_from(["canto", "apply"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_path_default() {
        let cli = Cli::try_parse_from(["canto", "auth"]).unwrap();
        assert_eq!(cli.render_path, PathBuf::from(DEFAULT_RENDER_PATH));
    }

    #[test]
    fn test_render_path_override() {
        let cli =
            Cli::try_parse_from(["canto", "--render-path", "/tmp/out", "generate", "c.json"])
                .unwrap();
        assert_eq!(cli.render_path, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_destroy_parsing() {
        let cli = Cli::try_parse_from(["canto", "destroy", "-y"]).unwrap();
        match cli.command {
            Commands::Destroy(cmd) => assert!(cmd.auto_approve),
            _ => panic!("Expected Destroy command"),
        }
    }

    #[test]
    fn test_artifact_get_parsing() {
        let cli = Cli::try_parse_from([
            "canto", "artifact", "-p", "sample", "get", "plan.bin", "-o", "out.bin",
        ])
        .unwrap();

        match cli.command {
            Commands::Artifact(cmd) => {
                assert_eq!(cmd.project, "sample");
                match cmd.action {
                    crate::commands::artifact::ArtifactAction::Get { name, output } => {
                        assert_eq!(name, "plan.bin");
                        assert_eq!(output, Some(PathBuf::from("out.bin")));
                    }
                    _ => panic!("Expected Get action"),
                }
            }
            _ => panic!("Expected Artifact command"),
        }
    }

    #[test]
    fn test_verbose_flag_count() {
        let cli = Cli::try_parse_from(["canto", "-vvv", "auth"]).unwrap();
        assert_eq!(cli.verbose, 3);

        let cli = Cli::try_parse_from(["canto", "auth"]).unwrap();
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_invalid_command_fails() {
        let result = Cli::try_parse_from(["canto", "harmonize"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_flag_works() {
        let result = Cli::try_parse_from(["canto", "--help"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_version_flag_works() {
        let result = Cli::try_parse_from(["canto", "--version"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayVersion);
        }
    }
}
