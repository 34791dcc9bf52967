/// Lineage resolution: the hop-bounded parent walk and main-rank projection
pub mod lineage;
/// Contains tracker for FN/TP/FP/TN counts and derived metrics
pub mod score_table;
/// The NCBI taxonomy dump parser and the immutable in-memory forest
pub mod taxonomy;
