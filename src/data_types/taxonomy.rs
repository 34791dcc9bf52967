use chrono::{DateTime, Local};
use derive_builder::Builder;
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The fixed root of the NCBI taxonomy; its parent pointer is a self-loop
pub const ROOT_TAXON_ID: u32 = 1;

/// Only rows with this name class are indexed for display names
pub const SCIENTIFIC_NAME_CLASS: &str = "scientific name";

/// Conventional dump filenames inside a taxdump folder
pub const DEFAULT_NODES_FILENAME: &str = "nodes.dmp";
/// See [DEFAULT_NODES_FILENAME]
pub const DEFAULT_NAMES_FILENAME: &str = "names.dmp";

#[derive(thiserror::Error, Debug)]
pub enum TaxonomyError {
    #[error("taxonomy source does not exist: {path:?}")]
    SourceNotFound { path: PathBuf },
    #[error("malformed taxonomy data in {path:?} at line {line}: {reason}")]
    MalformedData {
        path: PathBuf,
        line: usize,
        reason: String
    },
    #[error("taxon {taxon_id} references parent {parent_id}, which is not in the taxonomy")]
    UnresolvedParent { taxon_id: u32, parent_id: u32 },
    #[error("lineage of taxon {taxon_id} exceeds {max_hops} parent hops")]
    LineageDepthExceeded { taxon_id: u32, max_hops: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error)
}

/// One record in the taxonomy forest, keyed externally by taxon id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaxonNode {
    /// The unique taxon identifier
    taxon_id: u32,
    /// Parent taxon id; equal to `taxon_id` only at the root
    parent_id: u32,
    /// Rank label from the dump, e.g. "species" or "no rank"
    rank: String
}

impl TaxonNode {
    // getters
    pub fn taxon_id(&self) -> u32 {
        self.taxon_id
    }

    pub fn parent_id(&self) -> u32 {
        self.parent_id
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }

    /// True if this node is a fixed point of the parent relation
    pub fn is_root(&self) -> bool {
        self.taxon_id == ROOT_TAXON_ID || self.parent_id == self.taxon_id
    }
}

/// Describes where a taxonomy dump lives on disk.
/// Loading is one-shot; the resulting [TaxonomyStore] is immutable.
#[derive(Builder, Clone, Debug)]
pub struct TaxonomySource {
    /// Path to `nodes.dmp`, optionally gzip-compressed
    nodes_filename: PathBuf,
    /// Path to `names.dmp`, optionally gzip-compressed
    names_filename: PathBuf
}

impl TaxonomySource {
    /// Builds a source from a taxdump folder using the conventional filenames.
    /// # Arguments
    /// * `folder` - the extracted taxdump folder from the NCBI FTP site
    pub fn from_folder(folder: &Path) -> Self {
        Self {
            nodes_filename: folder.join(DEFAULT_NODES_FILENAME),
            names_filename: folder.join(DEFAULT_NAMES_FILENAME)
        }
    }

    /// Parses both dump files into an immutable store.
    /// # Errors
    /// * if either path does not exist or cannot be read
    /// * if a line does not have the expected field count, or a numeric field does not parse
    /// * if a parent reference does not resolve within the node table
    pub fn load(&self) -> Result<TaxonomyStore, TaxonomyError> {
        for (path, label) in [(&self.nodes_filename, "nodes"), (&self.names_filename, "names")] {
            match fetch_date(path) {
                Some(ts) => debug!("Taxonomy {label} file {path:?} fetched {ts}"),
                None => debug!("Taxonomy {label} file {path:?} has no readable timestamp")
            };
        }

        let nodes = parse_nodes(open_source(&self.nodes_filename)?, &self.nodes_filename)?;
        let names = parse_names(open_source(&self.names_filename)?, &self.names_filename)?;
        let store = TaxonomyStore::from_parts(nodes, names)?;
        info!("Loaded taxonomy: {} nodes, {} scientific names", store.node_count(), store.name_count());
        Ok(store)
    }
}

/// In-memory taxonomy forest with O(1) lookups by taxon id.
/// Immutable after construction, so it can be shared freely across threads.
#[derive(Clone, Debug, Default)]
pub struct TaxonomyStore {
    /// taxon id -> node record
    nodes: FxHashMap<u32, TaxonNode>,
    /// taxon id -> scientific name; synonyms are dropped at parse time
    names: FxHashMap<u32, String>
}

impl TaxonomyStore {
    /// Parses a store from in-memory readers, mostly useful for tests and piped inputs.
    /// Same validation as [TaxonomySource::load].
    pub fn from_readers(nodes: impl BufRead, names: impl BufRead) -> Result<Self, TaxonomyError> {
        let anon = PathBuf::from("<reader>");
        let nodes = parse_nodes(nodes, &anon)?;
        let names = parse_names(names, &anon)?;
        Self::from_parts(nodes, names)
    }

    /// Internal constructor that enforces the parent-resolution invariant.
    fn from_parts(nodes: FxHashMap<u32, TaxonNode>, names: FxHashMap<u32, String>) -> Result<Self, TaxonomyError> {
        for node in nodes.values() {
            if !node.is_root() && !nodes.contains_key(&node.parent_id) {
                return Err(TaxonomyError::UnresolvedParent {
                    taxon_id: node.taxon_id,
                    parent_id: node.parent_id
                });
            }
        }
        Ok(Self { nodes, names })
    }

    pub fn get_node(&self, taxon_id: u32) -> Option<&TaxonNode> {
        self.nodes.get(&taxon_id)
    }

    pub fn get_rank(&self, taxon_id: u32) -> Option<&str> {
        self.nodes.get(&taxon_id).map(|n| n.rank())
    }

    /// Returns the scientific name if one was indexed for this taxon.
    /// Taxa that only carried synonym rows in the names file have no entry here.
    pub fn get_name(&self, taxon_id: u32) -> Option<&str> {
        self.names.get(&taxon_id).map(|n| n.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}

/// On-demand variant of [TaxonomySource::load]: parsing is deferred until the
/// first lookup and cached for the lifetime of the handle.
#[derive(Debug)]
pub struct LazyTaxonomy {
    source: TaxonomySource,
    cache: OnceLock<TaxonomyStore>
}

impl LazyTaxonomy {
    pub fn new(source: TaxonomySource) -> Self {
        Self {
            source,
            cache: OnceLock::new()
        }
    }

    /// Returns the cached store, parsing the dump files on the first call.
    /// # Errors
    /// * same conditions as [TaxonomySource::load]; a failed load is not cached
    pub fn store(&self) -> Result<&TaxonomyStore, TaxonomyError> {
        if let Some(store) = self.cache.get() {
            return Ok(store);
        }
        let store = self.source.load()?;
        Ok(self.cache.get_or_init(|| store))
    }
}

/// Opens a dump file, decompressing transparently when the extension is `.gz`.
fn open_source(path: &Path) -> Result<Box<dyn BufRead>, TaxonomyError> {
    if !path.is_file() {
        return Err(TaxonomyError::SourceNotFound { path: path.to_path_buf() });
    }
    let file = File::open(path)?;
    if path.extension().unwrap_or_default() == "gz" {
        Ok(Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Local timestamp of a dump file, used to log how stale the taxonomy is.
fn fetch_date(path: &Path) -> Option<DateTime<Local>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::from(modified))
}

/// Splits one dump line on tabs and pulls the fields at the given positions.
/// The dump format interleaves "|" separator fields at the odd positions, so
/// callers ask for even positions only.
fn dump_fields<'a>(line: &'a str, positions: &[usize], path: &Path, line_number: usize) -> Result<Vec<&'a str>, TaxonomyError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let mut selected = Vec::with_capacity(positions.len());
    for &position in positions {
        match fields.get(position) {
            Some(field) => selected.push(field.trim()),
            None => {
                return Err(TaxonomyError::MalformedData {
                    path: path.to_path_buf(),
                    line: line_number,
                    reason: format!("expected at least {} tab-separated fields, found {}", position + 1, fields.len())
                });
            }
        }
    }
    Ok(selected)
}

fn parse_taxon_id(field: &str, path: &Path, line_number: usize) -> Result<u32, TaxonomyError> {
    field.parse().map_err(|_| TaxonomyError::MalformedData {
        path: path.to_path_buf(),
        line: line_number,
        reason: format!("taxon id is not a positive integer: {field:?}")
    })
}

/// Parses `nodes.dmp`: taxon id, parent id, and rank at tab positions 0, 2, 4.
fn parse_nodes(reader: impl BufRead, path: &Path) -> Result<FxHashMap<u32, TaxonNode>, TaxonomyError> {
    let mut nodes: FxHashMap<u32, TaxonNode> = Default::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let fields = dump_fields(&line, &[0, 2, 4], path, index + 1)?;
        let taxon_id = parse_taxon_id(fields[0], path, index + 1)?;
        let parent_id = parse_taxon_id(fields[1], path, index + 1)?;
        nodes.insert(taxon_id, TaxonNode {
            taxon_id,
            parent_id,
            rank: fields[2].to_string()
        });
    }
    Ok(nodes)
}

/// Parses `names.dmp`: taxon id, name, and name class at tab positions 0, 2, 6.
/// Only "scientific name" rows are kept, guaranteeing one display name per taxon.
fn parse_names(reader: impl BufRead, path: &Path) -> Result<FxHashMap<u32, String>, TaxonomyError> {
    let mut names: FxHashMap<u32, String> = Default::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let fields = dump_fields(&line, &[0, 2, 4, 6], path, index + 1)?;
        if fields[3] != SCIENTIFIC_NAME_CLASS {
            continue;
        }
        let taxon_id = parse_taxon_id(fields[0], path, index + 1)?;
        names.insert(taxon_id, fields[1].to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn node_line(taxon_id: u32, parent_id: u32, rank: &str) -> String {
        format!("{taxon_id}\t|\t{parent_id}\t|\t{rank}\t|\t\t|")
    }

    fn name_line(taxon_id: u32, name: &str, class: &str) -> String {
        format!("{taxon_id}\t|\t{name}\t|\t\t|\t{class}\t|")
    }

    fn small_store() -> TaxonomyStore {
        let nodes = [
            node_line(1, 1, "no rank"),
            node_line(2, 1, "superkingdom"),
            node_line(10, 2, "genus"),
            node_line(100, 10, "species")
        ].join("\n");
        let names = [
            name_line(2, "Bacteria", SCIENTIFIC_NAME_CLASS),
            name_line(10, "Tarsius", SCIENTIFIC_NAME_CLASS),
            name_line(100, "Tarsius syrichta", SCIENTIFIC_NAME_CLASS),
            name_line(100, "Philippine tarsier", "genbank common name")
        ].join("\n");
        TaxonomyStore::from_readers(Cursor::new(nodes), Cursor::new(names)).unwrap()
    }

    #[test]
    fn test_basic_lookups() {
        let store = small_store();
        assert_eq!(store.node_count(), 4);

        let species = store.get_node(100).unwrap();
        assert_eq!(species.taxon_id(), 100);
        assert_eq!(species.parent_id(), 10);
        assert_eq!(species.rank(), "species");
        assert!(!species.is_root());
        assert!(store.get_node(1).unwrap().is_root());

        assert_eq!(store.get_rank(10), Some("genus"));
        assert_eq!(store.get_name(100), Some("Tarsius syrichta"));
        assert_eq!(store.get_node(999), None);
        assert_eq!(store.get_rank(999), None);
    }

    #[test]
    fn test_scientific_name_filter() {
        // taxon 10 gets only non-scientific rows; rank lookups still work
        let nodes = [
            node_line(1, 1, "no rank"),
            node_line(10, 1, "genus")
        ].join("\n");
        let names = [
            name_line(10, "tarsiers", "genbank common name"),
            name_line(10, "Tarsius Storr, 1780", "authority")
        ].join("\n");
        let store = TaxonomyStore::from_readers(Cursor::new(nodes), Cursor::new(names)).unwrap();

        assert_eq!(store.get_name(10), None);
        assert_eq!(store.get_rank(10), Some("genus"));
        assert!(store.get_node(10).is_some());
        assert_eq!(store.name_count(), 0);
    }

    #[test]
    fn test_unresolved_parent() {
        let nodes = [
            node_line(1, 1, "no rank"),
            node_line(10, 99, "genus")
        ].join("\n");
        let result = TaxonomyStore::from_readers(Cursor::new(nodes), Cursor::new(String::new()));
        assert!(matches!(
            result,
            Err(TaxonomyError::UnresolvedParent { taxon_id: 10, parent_id: 99 })
        ));
    }

    #[test]
    fn test_malformed_lines() {
        // too few fields in nodes
        let result = TaxonomyStore::from_readers(Cursor::new("1\t|\t1"), Cursor::new(String::new()));
        assert!(matches!(result, Err(TaxonomyError::MalformedData { line: 1, .. })));

        // non-numeric taxon id
        let result = TaxonomyStore::from_readers(
            Cursor::new(node_line(1, 1, "no rank")),
            Cursor::new(name_line(0, "x", SCIENTIFIC_NAME_CLASS).replace('0', "abc"))
        );
        assert!(matches!(result, Err(TaxonomyError::MalformedData { .. })));
    }

    #[test]
    fn test_source_not_found() {
        let source = TaxonomySource::from_folder(Path::new("/definitely/not/a/taxdump"));
        assert!(matches!(source.load(), Err(TaxonomyError::SourceNotFound { .. })));
    }

    #[test]
    fn test_gzip_and_lazy_load() {
        use std::io::Write;

        // stage a tiny gzipped taxdump in the test temp dir
        let folder = std::env::temp_dir().join(format!("tarsier_taxdump_{}", std::process::id()));
        std::fs::create_dir_all(&folder).unwrap();
        let nodes_filename = folder.join("nodes.dmp.gz");
        let names_filename = folder.join("names.dmp");

        let nodes = [node_line(1, 1, "no rank"), node_line(10, 1, "genus")].join("\n");
        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&nodes_filename).unwrap(),
            flate2::Compression::default()
        );
        encoder.write_all(nodes.as_bytes()).unwrap();
        encoder.finish().unwrap();
        std::fs::write(&names_filename, name_line(10, "Tarsius", SCIENTIFIC_NAME_CLASS)).unwrap();

        let source = TaxonomySourceBuilder::default()
            .nodes_filename(nodes_filename)
            .names_filename(names_filename)
            .build()
            .unwrap();

        let lazy = LazyTaxonomy::new(source);
        let store = lazy.store().unwrap();
        assert_eq!(store.get_rank(10), Some("genus"));
        assert_eq!(store.get_name(10), Some("Tarsius"));

        // second call must serve the same cached parse
        let again = lazy.store().unwrap();
        assert!(std::ptr::eq(store, again));

        std::fs::remove_dir_all(&folder).unwrap();
    }

    #[test]
    fn test_source_builder() {
        let source = TaxonomySourceBuilder::default()
            .nodes_filename(PathBuf::from("/tmp/nodes.dmp"))
            .names_filename(PathBuf::from("/tmp/names.dmp"))
            .build()
            .unwrap();
        assert!(matches!(source.load(), Err(TaxonomyError::SourceNotFound { .. })));
    }
}
