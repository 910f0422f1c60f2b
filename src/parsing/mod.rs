/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// FASTA loading for the reference-pair truth derivation mode
pub mod reference;
/// Hand-rolled VCF parser that quarantines malformed rows instead of aborting
pub mod vcf;
