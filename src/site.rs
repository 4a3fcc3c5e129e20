//! Static-site rebuild.
//!
//! After a post is written the site generator (Hugo by default) is run in the
//! project root. Its output is inherited so the user sees Hugo's own summary;
//! only a failure to start or a non-zero exit is turned into an error.

use crate::config::SiteConfig;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("No site build command configured")]
    NoCommand,
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

/// Human-readable form of the configured command line.
pub fn command_line(config: &SiteConfig) -> String {
    std::iter::once(config.command.as_str())
        .chain(config.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the configured build command in `root`.
pub fn build_site(root: &Path, config: &SiteConfig) -> Result<(), SiteError> {
    if config.command.trim().is_empty() {
        return Err(SiteError::NoCommand);
    }
    let line = command_line(config);
    tracing::info!(command = %line, root = %root.display(), "building site");

    let status = Command::new(&config.command)
        .args(&config.args)
        .current_dir(root)
        .status()
        .map_err(|source| SiteError::Spawn {
            command: line.clone(),
            source,
        })?;

    if !status.success() {
        return Err(SiteError::Failed {
            command: line,
            status: status.to_string(),
        });
    }
    Ok(())
}
