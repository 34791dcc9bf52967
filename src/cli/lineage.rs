use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP};
use crate::data_types::taxonomy::{DEFAULT_NAMES_FILENAME, DEFAULT_NODES_FILENAME};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct LineageSettings {
    /// Taxon id to resolve
    #[clap(required = true)]
    #[clap(value_name = "TAXON_ID")]
    pub taxon_id: u32,

    /// NCBI taxdump folder containing nodes.dmp and names.dmp
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "taxonomy-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub taxonomy_folder: PathBuf,

    /// Overrides the nodes file location (plain or .gz)
    #[clap(long = "nodes")]
    #[clap(value_name = "DMP")]
    #[clap(help_heading = Some("Input/Output"))]
    pub nodes_filename: Option<PathBuf>,

    /// Overrides the names file location (plain or .gz)
    #[clap(long = "names")]
    #[clap(value_name = "DMP")]
    #[clap(help_heading = Some("Input/Output"))]
    pub names_filename: Option<PathBuf>,

    /// Restricts the output to the seven main ranks
    #[clap(long = "main-ranks-only")]
    pub main_ranks_only: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_lineage_settings(mut settings: LineageSettings) -> anyhow::Result<LineageSettings> {
    info!("Sub-command: lineage");
    info!("Inputs:");

    ensure!(settings.taxonomy_folder.is_dir(), "Taxonomy folder is not a directory: \"{}\"", settings.taxonomy_folder.display());

    if settings.nodes_filename.is_none() {
        settings.nodes_filename = Some(settings.taxonomy_folder.join(DEFAULT_NODES_FILENAME));
    }
    if settings.names_filename.is_none() {
        settings.names_filename = Some(settings.taxonomy_folder.join(DEFAULT_NAMES_FILENAME));
    }

    let nodes_filename = settings.nodes_filename.as_deref().unwrap();
    let names_filename = settings.names_filename.as_deref().unwrap();
    check_required_filename(nodes_filename, "Taxonomy nodes file")?;
    check_required_filename(names_filename, "Taxonomy names file")?;

    info!("\tTaxonomy nodes: {nodes_filename:?}");
    info!("\tTaxonomy names: {names_filename:?}");
    info!("\tTaxon id: {}", settings.taxon_id);
    info!("\tMain ranks only: {}", if settings.main_ranks_only { "ENABLED" } else { "DISABLED" });

    Ok(settings)
}
