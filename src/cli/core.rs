
use anyhow::bail;
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use std::path::Path;

use crate::cli::verify::VerifySettings;

lazy_static! {
    /// Stores the full version string we plan to use
    pub static ref FULL_VERSION: String = env!("CARGO_PKG_VERSION").to_string();

    /// Shared after help string containing the legalese.
    pub static ref AFTER_HELP: String = format!("Copyright (C) {}     the varify authors.
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
research use only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// Varify, a tool for verifying variant calls against truth sets.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Core function for measuring a called VCF relative to a truth set
    Verify(Box<VerifySettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a required file exists and errors otherwise
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}

/// Checks if an optionally-provided file exists and errors otherwise
/// # Arguments
/// * `opt_filename` - the file path to check for, if one was given
/// * `label` - the label to use for error messages
pub fn check_optional_filename(opt_filename: Option<&Path>, label: &str) -> anyhow::Result<()> {
    if let Some(filename) = opt_filename {
        if !filename.exists() {
            bail!("{} does not exist: \"{}\"", label, filename.display());
        }
    }

    // file either was not specified OR it exists
    Ok(())
}
