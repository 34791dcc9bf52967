use anyhow::{bail, Context};
use log::info;
use std::fs::File;
use std::path::Path;

use crate::rank_scorer::UNCLASSIFIED_TAXON_ID;

/// Whether the classifier made a call for a read
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::AsRefStr)]
pub enum ReadStatus {
    #[strum(serialize = "C")]
    Classified,
    #[strum(serialize = "U")]
    Unclassified
}

/// One row of classifier output: the call made for a single read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassifierRecord {
    pub status: ReadStatus,
    /// Read header as emitted by the simulator
    pub read_id: String,
    /// Predicted taxon; always [UNCLASSIFIED_TAXON_ID] for unclassified reads
    pub taxon_id: u32
}

/// Loads a kraken2-style output file: tab-separated rows of
/// `status(C/U), read id, taxon id, ...` with no header.
pub fn load_classifier_output(filename: &Path) -> anyhow::Result<Vec<ClassifierRecord>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let records = parse_classifier_output(file)
        .with_context(|| format!("Error while parsing {filename:?}:"))?;
    info!("Loaded {} classifier records from {filename:?}", records.len());
    Ok(records)
}

/// Reader-based form of [load_classifier_output].
pub fn parse_classifier_output(reader: impl std::io::Read) -> anyhow::Result<Vec<ClassifierRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true) // trailing columns vary between classifiers
        .quoting(false)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("Error while reading row {}", index + 1))?;
        if row.len() < 3 {
            bail!("Row {} has {} fields, expected at least 3", index + 1, row.len());
        }

        let status = match &row[0] {
            "C" => ReadStatus::Classified,
            "U" => ReadStatus::Unclassified,
            other => bail!("Row {} has unknown classification status {other:?}", index + 1)
        };
        let taxon_id = match status {
            // some classifiers leave junk in the taxon column for misses
            ReadStatus::Unclassified => UNCLASSIFIED_TAXON_ID,
            ReadStatus::Classified => row[2].trim().parse()
                .with_context(|| format!("Error while parsing taxon id on row {}: {:?}", index + 1, &row[2]))?
        };

        records.push(ClassifierRecord {
            status,
            read_id: row[1].to_string(),
            taxon_id
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let data = "C\tEscherichia_coli-0001\t562\t150\t562:120\n\
                    U\tMystery_bug-0002\t0\t150\t\n\
                    C\tTarsius_syrichta-0003\t100\t151\t100:88\n";
        let records = parse_classifier_output(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], ClassifierRecord {
            status: ReadStatus::Classified,
            read_id: "Escherichia_coli-0001".to_string(),
            taxon_id: 562
        });
        assert_eq!(records[1].status, ReadStatus::Unclassified);
        assert_eq!(records[1].taxon_id, UNCLASSIFIED_TAXON_ID);
    }

    #[test]
    fn test_unclassified_taxon_forced_to_zero() {
        // a stale taxon id on a U row must not leak through
        let records = parse_classifier_output("U\tread1\t562\n".as_bytes()).unwrap();
        assert_eq!(records[0].taxon_id, UNCLASSIFIED_TAXON_ID);
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert!(parse_classifier_output("C\tread1\n".as_bytes()).is_err());
        assert!(parse_classifier_output("X\tread1\t562\n".as_bytes()).is_err());
        assert!(parse_classifier_output("C\tread1\tnot_a_taxon\n".as_bytes()).is_err());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ReadStatus::Classified.as_ref(), "C");
        assert_eq!(ReadStatus::Unclassified.as_ref(), "U");
    }
}
