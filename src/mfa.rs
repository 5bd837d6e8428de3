use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};

/// Blocking source of MFA tokens. The resolver only ever needs one token
/// per role assumption; substituting a scripted implementation keeps the
/// interactive path out of automated tests.
pub trait TokenPrompt {
    fn prompt(&self, serial: &str) -> Result<String>;
}

/// Masked terminal prompt. Re-prompts on empty input with no bound or
/// timeout; only process interruption aborts it.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt;

impl TokenPrompt for TerminalPrompt {
    fn prompt(&self, serial: &str) -> Result<String> {
        read_until_nonempty(|| {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Enter MFA code for {serial}"))
                .allow_empty_password(true)
                .interact()
                .context("Failed to read MFA token")
        })
    }
}

fn read_until_nonempty<F>(mut read: F) -> Result<String>
where
    F: FnMut() -> Result<String>,
{
    loop {
        let token = read()?;
        if !token.is_empty() {
            return Ok(token);
        }
    }
}
