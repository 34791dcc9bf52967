use indexmap::IndexMap;
use indicatif::ParallelProgressIterator;
use log::debug;
use rayon::prelude::*;

use crate::data_types::lineage::{resolve, RankProjection, TaxRank, SCORED_RANKS};
use crate::data_types::score_table::ScoreTable;
use crate::data_types::taxonomy::TaxonomyStore;
use crate::util::get_progress_style;

/// Predicted taxon id meaning "the classifier made no call"
pub const UNCLASSIFIED_TAXON_ID: u32 = 0;

/// One classification to score: (true taxon id, predicted taxon id)
pub type ScorePair = (u32, u32);

/// Scores a batch of pairs at each rank in [SCORED_RANKS].
/// Pairs are independent, so the batch is chunked across the rayon pool and
/// the per-rank tables merged afterwards; results do not depend on order.
/// # Arguments
/// * `pairs` - the (true, predicted) taxon id pairs
/// * `store` - the loaded taxonomy
pub fn score_pairs(pairs: Vec<ScorePair>, store: &TaxonomyStore) -> IndexMap<TaxRank, ScoreTable> {
    let style = get_progress_style();
    let totals = pairs.into_par_iter()
        .map(|pair| score_single_pair(pair, store))
        .progress_with_style(style)
        .reduce(
            || [ScoreTable::default(); SCORED_RANKS.len()],
            |mut accumulator, tables| {
                for (total, table) in accumulator.iter_mut().zip(tables) {
                    *total += table;
                }
                accumulator
            }
        );

    SCORED_RANKS.into_iter().zip(totals).collect()
}

/// Buckets one pair at every scored rank.
fn score_single_pair((true_taxon_id, predicted_taxon_id): ScorePair, store: &TaxonomyStore) -> [ScoreTable; SCORED_RANKS.len()] {
    let truth = project_taxon(store, true_taxon_id);
    let predicted = project_taxon(store, predicted_taxon_id);

    let mut tables = [ScoreTable::default(); SCORED_RANKS.len()];
    for (table, rank) in tables.iter_mut().zip(SCORED_RANKS) {
        match (truth.taxon_at(rank), predicted.taxon_at(rank)) {
            // no truth at this rank counts as TN regardless of the prediction
            (None, _) => table.true_negatives += 1,
            // the classifier failed to resolve down to this rank
            (Some(_), None) => table.false_negatives += 1,
            (Some(t), Some(p)) if t == p => table.true_positives += 1,
            (Some(_), Some(_)) => table.false_positives += 1
        }
    }
    tables
}

/// Projects one side of a pair onto the main ranks.
/// The unclassified sentinel and any resolution failure both degrade to an
/// all-absent projection so a bad taxon never aborts the batch.
fn project_taxon(store: &TaxonomyStore, taxon_id: u32) -> RankProjection<'_> {
    if taxon_id == UNCLASSIFIED_TAXON_ID {
        return RankProjection::default();
    }
    match resolve(store, taxon_id) {
        Ok(lineage) => RankProjection::from_lineage(&lineage),
        Err(e) => {
            debug!("Treating taxon {taxon_id} as absent at all ranks: {e}");
            RankProjection::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn node_line(taxon_id: u32, parent_id: u32, rank: &str) -> String {
        format!("{taxon_id}\t|\t{parent_id}\t|\t{rank}\t|\t\t|")
    }

    /// Species 100 and 200 share genus 10; species 300 sits in an unrelated
    /// clade whose lineage skips class/order/family.
    fn fixture_store() -> TaxonomyStore {
        let nodes = [
            node_line(1, 1, "no rank"),
            node_line(2, 1, "superkingdom"),
            node_line(3, 2, "phylum"),
            node_line(4, 3, "class"),
            node_line(5, 4, "order"),
            node_line(6, 5, "family"),
            node_line(10, 6, "genus"),
            node_line(100, 10, "species"),
            node_line(200, 10, "species"),
            node_line(30, 2, "phylum"),
            node_line(31, 30, "genus"),
            node_line(300, 31, "species")
        ].join("\n");
        TaxonomyStore::from_readers(Cursor::new(nodes), Cursor::new(String::new())).unwrap()
    }

    #[test]
    fn test_worked_example() {
        let store = fixture_store();
        let pairs = vec![(100, 100), (100, 200), (100, 0), (0, 300)];
        let results = score_pairs(pairs, &store);

        // species: exact hit, wrong species, unresolved prediction, no truth
        assert_eq!(results[&TaxRank::Species], ScoreTable::new(1, 1, 1, 1));
        // genus: the wrong-species pair still lands in the right genus
        assert_eq!(results[&TaxRank::Genus], ScoreTable::new(1, 2, 0, 1));
        // phylum: same shape as genus
        assert_eq!(results[&TaxRank::Phylum], ScoreTable::new(1, 2, 0, 1));
    }

    #[test]
    fn test_rank_order() {
        let store = fixture_store();
        let results = score_pairs(vec![(100, 100)], &store);
        let ranks: Vec<TaxRank> = results.keys().copied().collect();
        assert_eq!(ranks, SCORED_RANKS.to_vec());
    }

    #[test]
    fn test_truth_absent_at_rank_is_tn() {
        let store = fixture_store();
        // truth 300 has no class/order/family; prediction 100 has all of them
        let results = score_pairs(vec![(300, 100)], &store);

        assert_eq!(results[&TaxRank::Species], ScoreTable::new(0, 0, 1, 0));
        assert_eq!(results[&TaxRank::Genus], ScoreTable::new(0, 0, 1, 0));
        // truth absent + prediction present stays TN, not FP
        assert_eq!(results[&TaxRank::Family], ScoreTable::new(0, 0, 0, 1));
        assert_eq!(results[&TaxRank::Order], ScoreTable::new(0, 0, 0, 1));
        assert_eq!(results[&TaxRank::Class], ScoreTable::new(0, 0, 0, 1));
        assert_eq!(results[&TaxRank::Phylum], ScoreTable::new(0, 0, 1, 0));
    }

    #[test]
    fn test_both_absent_is_tn() {
        let store = fixture_store();
        let results = score_pairs(vec![(0, 0)], &store);
        for rank in SCORED_RANKS {
            assert_eq!(results[&rank], ScoreTable::new(0, 0, 0, 1));
        }
    }

    #[test]
    fn test_unknown_taxa_degrade_to_absent() {
        let store = fixture_store();
        // both ids unknown to the store: all-absent on both sides, so TN
        let results = score_pairs(vec![(987654, 87654)], &store);
        assert_eq!(results[&TaxRank::Species], ScoreTable::new(0, 0, 0, 1));

        // unknown prediction with valid truth: FN at every truth-occupied rank
        let results = score_pairs(vec![(100, 87654)], &store);
        assert_eq!(results[&TaxRank::Species], ScoreTable::new(1, 0, 0, 0));
        assert_eq!(results[&TaxRank::Phylum], ScoreTable::new(1, 0, 0, 0));
    }

    #[test]
    fn test_empty_batch() {
        let store = fixture_store();
        let results = score_pairs(Vec::new(), &store);
        for rank in SCORED_RANKS {
            assert_eq!(results[&rank], ScoreTable::default());
            assert_eq!(results[&rank].precision(), None);
        }
    }

    #[test]
    fn test_cyclic_truth_does_not_abort_batch() {
        // 50 -> 51 -> 50 cycle next to a healthy species
        let nodes = [
            node_line(1, 1, "no rank"),
            node_line(10, 1, "genus"),
            node_line(100, 10, "species"),
            node_line(50, 51, "species"),
            node_line(51, 50, "genus")
        ].join("\n");
        let store = TaxonomyStore::from_readers(Cursor::new(nodes), Cursor::new(String::new())).unwrap();

        let results = score_pairs(vec![(50, 100), (100, 100)], &store);
        // the cyclic truth degrades to absent (TN), the healthy pair still scores
        assert_eq!(results[&TaxRank::Species], ScoreTable::new(0, 1, 0, 1));
        assert_eq!(results[&TaxRank::Genus], ScoreTable::new(0, 1, 0, 1));
    }
}
