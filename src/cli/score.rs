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
pub struct ScoreSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    tarsier_version: String,

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

    /// Classifier output file (kraken2-style TSV)
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "classifier-output")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub classifier_output_filename: PathBuf,

    /// Cluster representative table carrying the ground-truth taxon ids (CSV)
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "cluster-reps")]
    #[clap(value_name = "CSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub cluster_reps_filename: PathBuf,

    /// Output directory for the summary
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional label for the summary output rows
    #[clap(long = "score-label")]
    #[clap(value_name = "LABEL")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "score")]
    pub score_label: String,

    /// Number of threads to use in the scoring step
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_score_settings(mut settings: ScoreSettings) -> anyhow::Result<ScoreSettings> {
    // hard code the version in
    settings.tarsier_version = env!("CARGO_PKG_VERSION").to_string();
    info!("Tarsier version: {:?}", &settings.tarsier_version);
    info!("Sub-command: score");
    info!("Inputs:");

    ensure!(settings.taxonomy_folder.is_dir(), "Taxonomy folder is not a directory: \"{}\"", settings.taxonomy_folder.display());

    // resolve the conventional dump filenames unless overridden
    if settings.nodes_filename.is_none() {
        settings.nodes_filename = Some(settings.taxonomy_folder.join(DEFAULT_NODES_FILENAME));
    }
    if settings.names_filename.is_none() {
        settings.names_filename = Some(settings.taxonomy_folder.join(DEFAULT_NAMES_FILENAME));
    }

    // check for all the required input files
    let nodes_filename = settings.nodes_filename.as_deref().unwrap();
    let names_filename = settings.names_filename.as_deref().unwrap();
    check_required_filename(nodes_filename, "Taxonomy nodes file")?;
    check_required_filename(names_filename, "Taxonomy names file")?;
    check_required_filename(&settings.classifier_output_filename, "Classifier output")?;
    check_required_filename(&settings.cluster_reps_filename, "Cluster representatives")?;

    // dump stuff to the logger
    info!("\tTaxonomy nodes: {nodes_filename:?}");
    info!("\tTaxonomy names: {names_filename:?}");
    info!("\tClassifier output: {:?}", &settings.classifier_output_filename);
    info!("\tCluster representatives: {:?}", &settings.cluster_reps_filename);

    // outputs
    info!("Outputs:");
    info!("\tScore label: {:?}", &settings.score_label);
    info!("\tOutput folder: {:?}", &settings.output_folder);

    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
