//! Shell completion generation for dynbson
//!
//! This module provides functionality to generate shell completion scripts
//! for bash, zsh, fish, PowerShell and elvish.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

/// Binary name used in generated scripts
const BIN_NAME: &str = "dynbson";

/// Generate shell completion script
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish, powershell, elvish)
///
/// # Returns
/// * `Result<String>` - Completion script or error
pub fn generate_completion(shell_name: &str) -> Result<String> {
    let shell = parse_shell(shell_name)?;
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "pwsh" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(ConfigError::InvalidValue {
            field: "shell".to_string(),
            value: format!(
                "{} (supported shells: bash, zsh, fish, powershell, elvish)",
                shell_name
            ),
        }
        .into()),
    }
}
