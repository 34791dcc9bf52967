use anyhow::{bail, Context};
use log::info;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::path::Path;

/// Lookup from ground-truth organism name to its representative taxon id,
/// built from the cluster-representative table that accompanies a simulated
/// dataset.
#[derive(Clone, Debug, Default)]
pub struct ClusterRepresentatives {
    taxon_by_organism: FxHashMap<String, u32>
}

impl ClusterRepresentatives {
    /// Loads a `cluster_representative.csv` table: headered CSV where column 0
    /// is the representative taxon id and column 5 is the organism name.
    pub fn from_csv(filename: &Path) -> anyhow::Result<Self> {
        let file = File::open(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?;
        let reps = Self::from_reader(file)
            .with_context(|| format!("Error while parsing {filename:?}:"))?;
        info!("Loaded {} cluster representatives from {filename:?}", reps.len());
        Ok(reps)
    }

    /// Reader-based form of [ClusterRepresentatives::from_csv].
    pub fn from_reader(reader: impl std::io::Read) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let mut taxon_by_organism: FxHashMap<String, u32> = Default::default();
        for (index, result) in csv_reader.records().enumerate() {
            let row = result.with_context(|| format!("Error while reading row {}", index + 1))?;
            if row.len() < 6 {
                bail!("Row {} has {} fields, expected at least 6", index + 1, row.len());
            }

            let taxon_id: u32 = row[0].trim().parse()
                .with_context(|| format!("Error while parsing taxon id on row {}: {:?}", index + 1, &row[0]))?;
            let organism = row[5].trim().to_string();
            if organism.is_empty() {
                bail!("Row {} has an empty organism name", index + 1);
            }
            taxon_by_organism.insert(organism, taxon_id);
        }
        Ok(Self { taxon_by_organism })
    }

    pub fn taxon_for(&self, organism: &str) -> Option<u32> {
        self.taxon_by_organism.get(organism).copied()
    }

    pub fn len(&self) -> usize {
        self.taxon_by_organism.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxon_by_organism.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "taxid,cluster,members,completeness,contamination,organism_name,accession\n";

    #[test]
    fn test_from_reader() {
        let data = format!(
            "{HEADER}\
             562,c1,10,99.1,0.2,Escherichia coli,GCF_000005845.2\n\
             100,c2,4,97.5,0.0,Tarsius syrichta,GCF_000164805.1\n"
        );
        let reps = ClusterRepresentatives::from_reader(data.as_bytes()).unwrap();
        assert_eq!(reps.len(), 2);
        assert_eq!(reps.taxon_for("Escherichia coli"), Some(562));
        assert_eq!(reps.taxon_for("Tarsius syrichta"), Some(100));
        assert_eq!(reps.taxon_for("Bacillus subtilis"), None);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let short = format!("{HEADER}562,c1,10\n");
        assert!(ClusterRepresentatives::from_reader(short.as_bytes()).is_err());

        let bad_taxon = format!("{HEADER}xyz,c1,10,99.1,0.2,Escherichia coli,acc\n");
        assert!(ClusterRepresentatives::from_reader(bad_taxon.as_bytes()).is_err());
    }
}
