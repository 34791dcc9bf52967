use indexmap::IndexMap;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::lineage::TaxRank;
use crate::data_types::score_table::ScoreTable;

/// Accumulates per-rank score tables across batches and writes the final
/// rank-stratified summary.
#[derive(Clone, Debug, Default)]
pub struct RankSummaryWriter {
    /// User-provided label that goes on each row
    score_label: String,
    /// Per-rank totals, in scoring order
    rank_metrics: IndexMap<TaxRank, ScoreTable>
}

/// Contains all the data written to each row of the summary file
#[derive(Serialize)]
struct SummaryRow {
    /// User provided label
    score_label: String,
    /// The rank this row scores
    rank: String,
    false_negatives: u64,
    true_positives: u64,
    false_positives: u64,
    true_negatives: u64,
    /// Precision = TP / (TP + FP); empty when undefined
    metric_precision: Option<f64>,
    /// Recall = TP / (TP + FP + FN); empty when undefined
    metric_recall: Option<f64>,
    /// Harmonic mean of the two; empty when either is undefined
    metric_f1: Option<f64>
}

impl SummaryRow {
    fn new(score_label: String, rank: TaxRank, table: &ScoreTable) -> Self {
        Self {
            score_label,
            rank: rank.to_string(),
            false_negatives: table.false_negatives,
            true_positives: table.true_positives,
            false_positives: table.false_positives,
            true_negatives: table.true_negatives,
            metric_precision: table.precision(),
            metric_recall: table.recall(),
            metric_f1: table.f1()
        }
    }
}

impl RankSummaryWriter {
    /// Creates a new writer to accumulate rank tables
    pub fn new(score_label: String) -> Self {
        Self {
            score_label,
            ..Default::default()
        }
    }

    /// Merges a batch of per-rank tables into the running totals.
    /// # Arguments
    /// * `rank_tables` - output of one scoring run
    pub fn add_rank_tables(&mut self, rank_tables: &IndexMap<TaxRank, ScoreTable>) {
        for (&rank, &table) in rank_tables {
            let entry = self.rank_metrics.entry(rank).or_default();
            *entry += table;
        }
    }

    /// Read-only view of the accumulated totals
    pub fn rank_metrics(&self) -> &IndexMap<TaxRank, ScoreTable> {
        &self.rank_metrics
    }

    /// Writes one row per scored rank; tab-separated unless the filename
    /// ends with `.csv`.
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        for (&rank, table) in &self.rank_metrics {
            csv_writer.serialize(SummaryRow::new(self.score_label.clone(), rank, table))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Logs the summary as a console table, one line per rank.
    pub fn log_report(&self) {
        info!("rank\tFN\tTP\tFP\tTN\tprecision\trecall");
        for (&rank, table) in &self.rank_metrics {
            info!(
                "{rank}\t{}\t{}\t{}\t{}\t{}\t{}",
                table.false_negatives,
                table.true_positives,
                table.false_positives,
                table.true_negatives,
                format_metric(table.precision()),
                format_metric(table.recall())
            );
        }
    }
}

/// Three decimals, or "NA" for an undefined metric
fn format_metric(metric: Option<f64>) -> String {
    match metric {
        Some(value) => format!("{value:.3}"),
        None => "NA".to_string()
    }
}
