use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::aws::CredentialContext;
use crate::constants::{AMBIENT_CREDENTIAL_VARS, ENV_TERRAFORM_BIN};

/// Invokes the terraform binary against the render directory. Callers hand
/// over an already-verified credential context; this module only applies
/// the environment contract and reports exit status.
#[derive(Debug, Clone)]
pub struct Terraform {
    bin: PathBuf,
    working_dir: PathBuf,
}

impl Terraform {
    pub fn new(bin: PathBuf, working_dir: &Path) -> Self {
        Self {
            bin,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Binary from CANTO_TERRAFORM_BIN, else `terraform` on PATH
    pub fn from_env(working_dir: &Path) -> Self {
        let bin = env::var(ENV_TERRAFORM_BIN)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("terraform"));

        Self::new(bin, working_dir)
    }

    pub fn init(&self, context: Option<&CredentialContext>) -> Result<()> {
        self.run(&init_args(), context)
            .context("Terraform provider initialization failed")?;

        info!("Successfully initialized");
        Ok(())
    }

    pub fn apply(
        &self,
        auto_approve: bool,
        skip_refresh: bool,
        context: Option<&CredentialContext>,
    ) -> Result<()> {
        self.run(&apply_args(auto_approve, skip_refresh), context)
            .context("Terraform apply failed")?;

        info!("Successfully applied");
        Ok(())
    }

    pub fn destroy(&self, auto_approve: bool, context: Option<&CredentialContext>) -> Result<()> {
        self.run(&destroy_args(auto_approve), context)
            .context("Terraform destroy failed")?;

        info!("Successfully destroyed");
        Ok(())
    }

    /// Run one terraform subcommand with inherited stdio. With an explicit
    /// context, the ambient credential variables are scrubbed first so the
    /// subprocess observes exactly the resolved context.
    fn run(&self, args: &[String], context: Option<&CredentialContext>) -> Result<()> {
        debug!("Running {} {}", self.bin.display(), args.join(" "));

        let mut command = Command::new(&self.bin);
        command.args(args).current_dir(&self.working_dir);

        if let Some(context) = context {
            for var in AMBIENT_CREDENTIAL_VARS {
                command.env_remove(var);
            }
            command.envs(context.env_vars());
        }

        let status = command.status().with_context(|| {
            format!(
                "Failed to execute {} — is Terraform installed?",
                self.bin.display()
            )
        })?;

        if !status.success() {
            bail!(
                "terraform {} exited with status code {}",
                args.first().map(String::as_str).unwrap_or(""),
                status.code().unwrap_or(-1)
            );
        }

        Ok(())
    }
}

fn init_args() -> Vec<String> {
    vec!["init".to_string()]
}

fn apply_args(auto_approve: bool, skip_refresh: bool) -> Vec<String> {
    let mut args = vec!["apply".to_string()];

    if auto_approve {
        args.push("-auto-approve".to_string());
    }

    if skip_refresh {
        args.push("-refresh=false".to_string());
    }

    args
}

fn destroy_args(auto_approve: bool) -> Vec<String> {
    let mut args = vec!["destroy".to_string()];

    if auto_approve {
        args.push("-auto-approve".to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_apply_args() {
        assert_eq!(apply_args(false, false), vec!["apply"]);
        assert_eq!(apply_args(true, false), vec!["apply", "-auto-approve"]);
        assert_eq!(
            apply_args(true, true),
            vec!["apply", "-auto-approve", "-refresh=false"]
        );
        assert_eq!(apply_args(false, true), vec!["apply", "-refresh=false"]);
    }

    #[test]
    fn test_destroy_args() {
        assert_eq!(destroy_args(false), vec!["destroy"]);
        assert_eq!(destroy_args(true), vec!["destroy", "-auto-approve"]);
    }

    #[test]
    #[serial]
    fn test_binary_from_env() {
        let original = env::var(ENV_TERRAFORM_BIN).ok();

        unsafe {
            env::set_var(ENV_TERRAFORM_BIN, "/opt/terraform/bin/terraform");
        }
        let terraform = Terraform::from_env(Path::new("./render"));
        assert_eq!(terraform.bin, PathBuf::from("/opt/terraform/bin/terraform"));

        unsafe {
            match original {
                Some(val) => env::set_var(ENV_TERRAFORM_BIN, val),
                None => env::remove_var(ENV_TERRAFORM_BIN),
            }
        }
    }

    #[test]
    #[serial]
    fn test_binary_defaults_to_path_lookup() {
        let original = env::var(ENV_TERRAFORM_BIN).ok();

        unsafe {
            env::remove_var(ENV_TERRAFORM_BIN);
        }
        let terraform = Terraform::from_env(Path::new("./render"));
        assert_eq!(terraform.bin, PathBuf::from("terraform"));

        unsafe {
            if let Some(val) = original {
                env::set_var(ENV_TERRAFORM_BIN, val);
            }
        }
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let terraform = Terraform::new(PathBuf::from("/nonexistent/terraform"), Path::new("."));
        let err = terraform.init(None).unwrap_err();
        assert!(format!("{err:#}").contains("is Terraform installed"));
    }
}
