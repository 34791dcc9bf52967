use log::warn;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::data_types::taxonomy::{TaxonNode, TaxonomyError, TaxonomyStore};

/// Walks longer than this are treated as corrupted dump data, not real lineages
pub const MAX_LINEAGE_HOPS: usize = 100;

/// The seven main ranks of the NCBI taxonomy, highest first.
/// Everything else in the dump ("no rank", "tribe", "subspecies", ...) is
/// carried through lineages verbatim but never occupies a projection slot.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, AsRefStr, Display, EnumString)]
pub enum TaxRank {
    #[strum(ascii_case_insensitive, serialize = "superkingdom")]
    Superkingdom = 0,
    #[strum(ascii_case_insensitive, serialize = "phylum")]
    Phylum,
    #[strum(ascii_case_insensitive, serialize = "class")]
    Class,
    #[strum(ascii_case_insensitive, serialize = "order")]
    Order,
    #[strum(ascii_case_insensitive, serialize = "family")]
    Family,
    #[strum(ascii_case_insensitive, serialize = "genus")]
    Genus,
    #[strum(ascii_case_insensitive, serialize = "species")]
    Species
}

/// All seven main ranks in hierarchy order
pub const MAIN_RANKS: [TaxRank; 7] = [
    TaxRank::Superkingdom,
    TaxRank::Phylum,
    TaxRank::Class,
    TaxRank::Order,
    TaxRank::Family,
    TaxRank::Genus,
    TaxRank::Species
];

/// The ranks that get scored, deepest first; superkingdom is excluded
/// because it is rarely informative for classifier evaluation.
pub const SCORED_RANKS: [TaxRank; 6] = [
    TaxRank::Species,
    TaxRank::Genus,
    TaxRank::Family,
    TaxRank::Order,
    TaxRank::Class,
    TaxRank::Phylum
];

/// One node visited on a root-to-leaf walk, borrowing from the store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineageStep<'a> {
    pub taxon_id: u32,
    pub node: &'a TaxonNode,
    /// Scientific name, when one was indexed
    pub name: Option<&'a str>
}

/// Ordered root-first sequence of visited nodes; the queried taxon is last.
pub type Lineage<'a> = Vec<LineageStep<'a>>;

/// Walks parent pointers from `taxon_id` up to the root.
/// Taxon id 0 and ids unknown to the store are "no classification" sentinels
/// and resolve to an empty lineage rather than an error.
/// # Arguments
/// * `store` - the loaded taxonomy
/// * `taxon_id` - the leaf to walk up from
/// # Errors
/// * `LineageDepthExceeded` - the walk passed [MAX_LINEAGE_HOPS] hops, which only happens on cyclic or corrupted dumps
/// * `UnresolvedParent` - a parent pointer left the store, which load-time validation normally rules out
pub fn resolve<'a>(store: &'a TaxonomyStore, taxon_id: u32) -> Result<Lineage<'a>, TaxonomyError> {
    if taxon_id == 0 {
        return Ok(Vec::new());
    }
    let Some(mut node) = store.get_node(taxon_id) else {
        return Ok(Vec::new());
    };

    let mut steps = vec![lineage_step(store, node)];
    let mut hops: usize = 0;
    while !node.is_root() {
        let parent_id = node.parent_id();
        let parent = store.get_node(parent_id).ok_or(TaxonomyError::UnresolvedParent {
            taxon_id: node.taxon_id(),
            parent_id
        })?;
        steps.push(lineage_step(store, parent));
        node = parent;

        hops += 1;
        if hops > MAX_LINEAGE_HOPS {
            return Err(TaxonomyError::LineageDepthExceeded {
                taxon_id,
                max_hops: MAX_LINEAGE_HOPS
            });
        }
    }

    // collected leaf-first, callers get root-first
    steps.reverse();
    Ok(steps)
}

fn lineage_step<'a>(store: &'a TaxonomyStore, node: &'a TaxonNode) -> LineageStep<'a> {
    LineageStep {
        taxon_id: node.taxon_id(),
        node,
        name: store.get_name(node.taxon_id())
    }
}

/// The occupant of one main-rank slot in a projected lineage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RankEntry<'a> {
    pub taxon_id: u32,
    pub name: Option<&'a str>
}

/// A lineage projected onto the seven main ranks; ranks the lineage skips are absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankProjection<'a> {
    slots: [Option<RankEntry<'a>>; MAIN_RANKS.len()]
}

impl<'a> RankProjection<'a> {
    /// Scans a root-first lineage and fills each main-rank slot.
    /// A well-formed lineage visits each rank at most once; if the dump
    /// disagrees, the occurrence closest to the root wins and the collision
    /// is logged as a data-quality signal.
    pub fn from_lineage(lineage: &Lineage<'a>) -> Self {
        let mut slots = [None; MAIN_RANKS.len()];
        for step in lineage {
            let Ok(rank) = step.node.rank().parse::<TaxRank>() else {
                continue;
            };
            let slot = &mut slots[rank as usize];
            match slot {
                Some(RankEntry { taxon_id, .. }) => {
                    warn!(
                        "Lineage of taxon {} contains multiple {rank} nodes; keeping {} over {}",
                        lineage.last().map(|s| s.taxon_id).unwrap_or_default(),
                        taxon_id,
                        step.taxon_id
                    );
                },
                None => {
                    *slot = Some(RankEntry {
                        taxon_id: step.taxon_id,
                        name: step.name
                    });
                }
            }
        }
        Self { slots }
    }

    pub fn get(&self, rank: TaxRank) -> Option<RankEntry<'a>> {
        self.slots[rank as usize]
    }

    /// Just the taxon id at a rank, which is all the scorer compares
    pub fn taxon_at(&self, rank: TaxRank) -> Option<u32> {
        self.slots[rank as usize].map(|entry| entry.taxon_id)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }
}
