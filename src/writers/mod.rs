/*!
# Writers module
Contains the logic for writing the outputs of the score command.
*/
/// Generates the rank-stratified summary file and console report
pub mod summary;
