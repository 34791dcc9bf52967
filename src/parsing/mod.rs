/*!
# Parsing module
Contains the logic for parsing classifier output and ground-truth tables into
the (true, predicted) taxon pairs the scorer consumes.
*/
/// Parser for kraken2-style classifier output rows
pub mod classifier_output;
/// Parser for the cluster-representative ground-truth table
pub mod cluster_reps;

use log::{debug, warn};

use crate::parsing::classifier_output::ClassifierRecord;
use crate::parsing::cluster_reps::ClusterRepresentatives;
use crate::rank_scorer::ScorePair;

/// Joins classifier records against the ground-truth lookup to build the
/// scorer input. Reads whose organism has no representative are skipped;
/// the number skipped is returned alongside the pairs.
/// # Arguments
/// * `records` - the parsed classifier output
/// * `representatives` - organism -> taxon id ground truth
pub fn build_score_pairs(records: &[ClassifierRecord], representatives: &ClusterRepresentatives) -> (Vec<ScorePair>, usize) {
    let mut pairs = Vec::with_capacity(records.len());
    let mut unmatched: usize = 0;
    for record in records {
        let organism = organism_from_read_id(&record.read_id);
        match representatives.taxon_for(&organism) {
            Some(true_taxon_id) => pairs.push((true_taxon_id, record.taxon_id)),
            None => {
                debug!("No ground-truth representative for read {:?} (organism {organism:?})", record.read_id);
                unmatched += 1;
            }
        }
    }
    if unmatched > 0 {
        warn!("{unmatched} of {} reads had no ground-truth representative and were skipped", records.len());
    }
    (pairs, unmatched)
}

/// Recovers the ground-truth organism from a simulated read header, which is
/// formed as `<Organism_name>-<read number>` with underscores for spaces.
fn organism_from_read_id(read_id: &str) -> String {
    read_id.split('-').next().unwrap_or(read_id).replace('_', " ")
}
