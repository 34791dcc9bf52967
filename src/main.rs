use log::{LevelFilter, error, info, warn};
use std::time::Instant;

use tarsier::cli::core::{Commands, get_cli};
use tarsier::cli::lineage::{LineageSettings, check_lineage_settings};
use tarsier::cli::score::{ScoreSettings, check_score_settings};
use tarsier::data_types::lineage::{MAIN_RANKS, RankProjection, resolve};
use tarsier::data_types::taxonomy::{TaxonomySource, TaxonomySourceBuilder, TaxonomyStore};
use tarsier::parsing::build_score_pairs;
use tarsier::parsing::classifier_output::load_classifier_output;
use tarsier::parsing::cluster_reps::ClusterRepresentatives;
use tarsier::rank_scorer::score_pairs;
use tarsier::util::save_json;
use tarsier::writers::summary::RankSummaryWriter;

/// Maps the -v count onto the env_logger filter and initializes it
fn setup_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Builds the dump source from checked settings; both overrides are filled
/// in by the settings check beforehand.
fn build_taxonomy_source(nodes_filename: Option<std::path::PathBuf>, names_filename: Option<std::path::PathBuf>) -> TaxonomySource {
    let builder_result = TaxonomySourceBuilder::default()
        .nodes_filename(nodes_filename.unwrap_or_default())
        .names_filename(names_filename.unwrap_or_default())
        .build();
    match builder_result {
        Ok(source) => source,
        Err(e) => {
            error!("Error while building taxonomy source: {e}");
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn load_taxonomy(source: &TaxonomySource) -> TaxonomyStore {
    info!("Loading taxonomy into memory...");
    match source.load() {
        Ok(store) => store,
        Err(e) => {
            error!("Error while loading taxonomy: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }
}

fn run_score(settings: ScoreSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    setup_logging(settings.verbosity);

    let settings = match check_score_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // save the CLI options
    let cli_json = settings.output_folder.join("settings.json");
    info!("Saving CLI options to {cli_json:?}...");
    if let Err(e) = save_json(&settings, &cli_json) {
        error!("Error while saving CLI options: {e}");
        std::process::exit(exitcode::IOERR);
    }

    // one-shot taxonomy load; everything downstream is read-only
    let source = build_taxonomy_source(settings.nodes_filename.clone(), settings.names_filename.clone());
    let taxonomy = load_taxonomy(&source);

    // pull in the classifier calls and the ground truth they get joined against
    let records = match load_classifier_output(&settings.classifier_output_filename) {
        Ok(records) => records,
        Err(e) => {
            error!("Error while loading classifier output: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let representatives = match ClusterRepresentatives::from_csv(&settings.cluster_reps_filename) {
        Ok(reps) => reps,
        Err(e) => {
            error!("Error while loading cluster representatives: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let (pairs, unmatched) = build_score_pairs(&records, &representatives);
    if pairs.is_empty() {
        warn!("No scorable pairs were built ({unmatched} reads unmatched); summary will be empty.");
    }

    info!("Scoring {} pairs...", pairs.len());
    let rank_tables = score_pairs(pairs, &taxonomy);

    let mut summary_writer = RankSummaryWriter::new(settings.score_label.clone());
    summary_writer.add_rank_tables(&rank_tables);
    summary_writer.log_report();

    // now write things
    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving output summary to {summary_fn:?}...");
    if let Err(e) = summary_writer.write_summary(&summary_fn) {
        error!("Error while saving summary file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Scoring completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_lineage(settings: LineageSettings) {
    // set up logging before we check the other settings
    setup_logging(settings.verbosity);

    let settings = match check_lineage_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let source = build_taxonomy_source(settings.nodes_filename.clone(), settings.names_filename.clone());
    let taxonomy = load_taxonomy(&source);

    let lineage = match resolve(&taxonomy, settings.taxon_id) {
        Ok(lineage) => lineage,
        Err(e) => {
            error!("Error while resolving lineage: {e}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    if lineage.is_empty() {
        warn!("Taxon {} is not present in the taxonomy; nothing to report.", settings.taxon_id);
        return;
    }

    if settings.main_ranks_only {
        let projection = RankProjection::from_lineage(&lineage);
        println!("rank\ttaxon_id\tname");
        for rank in MAIN_RANKS {
            match projection.get(rank) {
                Some(entry) => println!("{rank}\t{}\t{}", entry.taxon_id, entry.name.unwrap_or("-")),
                None => println!("{rank}\t-\t-")
            }
        }
    } else {
        println!("taxon_id\trank\tname");
        for step in &lineage {
            println!("{}\t{}\t{}", step.taxon_id, step.node.rank(), step.name.unwrap_or("-"));
        }
    }
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Score(settings) => {
            run_score(*settings);
        },
        Commands::Lineage(settings) => {
            run_lineage(*settings);
        }
    }

    info!("Process finished successfully.");
}
