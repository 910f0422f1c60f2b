
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Core logic for pairing called variants against truth and classifying both sides
pub mod matcher;
/// Converts parsed records into minimal, locus-anchored variants
pub mod normalize;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Builds the truth set, from a truth VCF or from a reference pair
pub mod truth_builder;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
