use anyhow::bail;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use std::path::Path;

use crate::cli::lineage::LineageSettings;
use crate::cli::score::ScoreSettings;

lazy_static! {
    /// Shared after-help string for every subcommand
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2024-{}     Tarsier contributors.
Tarsier is research software; its outputs are not intended for
diagnostic or clinical use.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// Tarsier, big eyes for small taxa.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Scores classifier output against ground truth at each main taxonomic rank
    Score(Box<ScoreSettings>),
    /// Resolves one taxon id to its full root-to-leaf lineage
    Lineage(Box<LineageSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks that a required input file exists, bailing with its label otherwise
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }
    Ok(())
}
