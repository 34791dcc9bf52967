/*!
# CLI module
Command line interface functionality that is specific to Tarsier.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The lineage CLI subcommand
pub mod lineage;
/// The score CLI subcommand
pub mod score;
