/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Contains the logic for parsing classifier output into scorable pairs
pub mod parsing;
/// Core logic for scoring (true, predicted) taxon pairs at each main rank
pub mod rank_scorer;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
