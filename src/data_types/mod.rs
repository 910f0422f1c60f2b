
/// Contains the fully typed representation of a single VCF data row
pub mod call_record;
/// Wrapper containing SummaryMetrics overall plus per-class and per-contig breakdowns
pub mod grouped_metrics;
/// Contains the typed snapshot of everything a VCF header declares
pub mod header_metadata;
/// Contains the per-variant classification produced by the matcher
pub mod match_outcome;
/// Contains the locus-anchored minimal edit representation and truth tagging
pub mod normalized_variant;
/// Contains tracker for TP, FP, FN and derived metrics
pub mod summary_metrics;
