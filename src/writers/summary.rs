
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::data_types::grouped_metrics::GroupedMetrics;
use crate::data_types::match_outcome::MatchOutcome;
use crate::data_types::summary_metrics::SummaryMetrics;
use crate::parsing::vcf::RecordDefect;

/// This is a wrapper for accumulating match outcomes and writing the summary stats file.
/// It is the sole owner of the final tally; per-contig partial results are folded in
/// one at a time, ordered by contig name, so repeated runs produce identical bytes.
#[derive(Default)]
pub struct SummaryWriter {
    /// Verification label to go on each row
    verify_label: String,
    /// The accumulated metrics: overall, per-class, and per-contig
    metrics: GroupedMetrics,
    /// Count of quarantined called records, by defect kind label
    defect_counts: BTreeMap<String, u64>,
    /// Number of contig batches that completed
    solved_contigs: u64,
    /// Number of contig batches that failed
    error_contigs: u64
}

/// Contains all the data written to each row of our stats file
#[derive(Serialize)]
struct SummaryRow {
    /// User provided label
    verify_label: String,
    /// Row scope: ALL, CLASS, or CONTIG
    scope: String,
    /// The class or contig this row describes; ALL for the overall row
    category: String,
    /// Total number of truth variants in this row's scope
    truth_total: u64,
    /// Truth variants found in the calls
    truth_tp: u64,
    /// Truth variants missing from the calls
    truth_fn: u64,
    /// Truth variants with a locus/allele match but disagreeing zygosity
    truth_gt_mismatch: u64,
    /// Truth variants with unresolved candidate ties
    truth_ambiguous: u64,
    /// Total number of called variants in this row's scope
    query_total: u64,
    /// Called variants found in truth
    query_tp: u64,
    /// Called variants with no truth support
    query_fp: u64,
    /// Called variants with a locus/allele match but disagreeing zygosity
    query_gt_mismatch: u64,
    /// Called variants with unresolved candidate ties
    query_ambiguous: u64,
    /// Recall = truth.TP / (truth.TP + truth.FN); empty when undefined
    metric_recall: Option<f64>,
    /// Precision = query.TP / (query.TP + query.FP); empty when undefined
    metric_precision: Option<f64>,
    /// F1 = combination score of recall and precision; empty when undefined
    metric_f1: Option<f64>
}

impl SummaryRow {
    /// Creates a new row from labels and summary metrics
    fn new(verify_label: String, scope: String, category: String, metrics: &SummaryMetrics) -> Self {
        Self {
            verify_label,
            scope,
            category,
            truth_total: metrics.truth_tp + metrics.truth_fn + metrics.truth_gt_mismatch + metrics.truth_ambiguous,
            truth_tp: metrics.truth_tp,
            truth_fn: metrics.truth_fn,
            truth_gt_mismatch: metrics.truth_gt_mismatch,
            truth_ambiguous: metrics.truth_ambiguous,
            query_total: metrics.query_tp + metrics.query_fp + metrics.query_gt_mismatch + metrics.query_ambiguous,
            query_tp: metrics.query_tp,
            query_fp: metrics.query_fp,
            query_gt_mismatch: metrics.query_gt_mismatch,
            query_ambiguous: metrics.query_ambiguous,
            metric_recall: metrics.recall(),
            metric_precision: metrics.precision(),
            metric_f1: metrics.f1()
        }
    }
}

impl SummaryWriter {
    /// Creates a new writer to accumulate stats
    pub fn new(verify_label: String) -> Self {
        Self {
            verify_label,
            ..Default::default()
        }
    }

    /// Folds one contig batch of outcomes into the tally
    /// # Arguments
    /// * `outcomes` - the outcomes from one contig comparison
    pub fn add_outcomes(&mut self, outcomes: &[MatchOutcome]) {
        self.metrics.add_outcomes(outcomes);
        self.solved_contigs += 1;
    }

    /// Records a contig batch that failed to compare
    pub fn add_contig_error(&mut self) {
        self.error_contigs += 1;
    }

    /// Records the quarantined records from parsing
    /// # Arguments
    /// * `defects` - the collected parse defects
    pub fn add_defects(&mut self, defects: &[RecordDefect]) {
        for defect in defects.iter() {
            let entry = self.defect_counts.entry(defect.kind().as_ref().to_string()).or_default();
            *entry += 1;
        }
    }

    /// Will write the summary out to the given file path
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        // the overall row first
        let all_row = SummaryRow::new(
            self.verify_label.clone(), "ALL".to_string(), "ALL".to_string(), self.metrics.overall()
        );
        csv_writer.serialize(&all_row)?;

        // per-class rows; BTreeMap ordering keeps these stable
        for (class, metrics) in self.metrics.by_class().iter() {
            let row = SummaryRow::new(
                self.verify_label.clone(), "CLASS".to_string(), format!("{class:?}"), metrics
            );
            csv_writer.serialize(&row)?;
        }

        // per-contig rows, ordered by contig name
        for (contig, metrics) in self.metrics.by_contig().iter() {
            let row = SummaryRow::new(
                self.verify_label.clone(), "CONTIG".to_string(), contig.clone(), metrics
            );
            csv_writer.serialize(&row)?;
        }

        // save everything
        csv_writer.flush()?;
        Ok(())
    }

    /// Builds the end-of-run report that distinguishes "completed with N skipped records"
    /// from a run that never finished (which produces no report at all)
    /// # Arguments
    /// * `called_records` - number of accepted called records
    /// * `called_variants` - number of normalized called variants
    /// * `truth_variants` - number of truth variants
    pub fn build_run_report(&self, called_records: u64, called_variants: u64, truth_variants: u64) -> RunReport {
        RunReport {
            verify_label: self.verify_label.clone(),
            called_records,
            called_variants,
            truth_variants,
            malformed_records: self.defect_counts.values().sum(),
            defect_counts: self.defect_counts.clone(),
            solved_contigs: self.solved_contigs,
            error_contigs: self.error_contigs
        }
    }

    // getters
    pub fn metrics(&self) -> &GroupedMetrics {
        &self.metrics
    }

    pub fn solved_contigs(&self) -> u64 {
        self.solved_contigs
    }

    pub fn error_contigs(&self) -> u64 {
        self.error_contigs
    }
}

/// Machine-readable end-of-run accounting, saved alongside the summary
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// User provided label
    pub verify_label: String,
    /// Accepted called records
    pub called_records: u64,
    /// Normalized called variants (post multi-allelic splitting)
    pub called_variants: u64,
    /// Truth variants after normalization/derivation
    pub truth_variants: u64,
    /// Total quarantined records
    pub malformed_records: u64,
    /// Quarantined records broken down by defect kind
    pub defect_counts: BTreeMap<String, u64>,
    /// Contig batches that completed
    pub solved_contigs: u64,
    /// Contig batches that failed
    pub error_contigs: u64
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::call_record::Zygosity;
    use crate::data_types::match_outcome::{Classification, VariantSource};
    use crate::data_types::normalized_variant::{NormalizedVariant, TruthProvenance, TruthVariant};
    use crate::matcher::{match_variants, MatchConfig};

    fn fixture_snp() -> NormalizedVariant {
        NormalizedVariant::new(
            "ref.1".to_string(), 100, b"T".to_vec(), b"A".to_vec(), Zygosity::HomozygousAlternate
        ).unwrap()
    }

    #[test]
    fn test_end_to_end_perfect_contig() {
        // the fixture SNP on both sides: one TP pair, precision and recall both 1.0 on ref.1
        let called = vec![fixture_snp()];
        let truth = vec![TruthVariant::new(fixture_snp(), TruthProvenance::TruthVcf)];
        let outcomes = match_variants(&called, &truth, MatchConfig::default()).unwrap();

        let mut writer = SummaryWriter::new("verify".to_string());
        writer.add_outcomes(&outcomes);

        let contig_metrics = writer.metrics().contig_metrics("ref.1").unwrap();
        assert_eq!(contig_metrics.truth_tp, 1);
        assert_eq!(contig_metrics.query_tp, 1);
        assert_eq!(contig_metrics.precision(), Some(1.0));
        assert_eq!(contig_metrics.recall(), Some(1.0));
        assert_eq!(writer.solved_contigs(), 1);
    }

    #[test]
    fn test_summary_file_is_deterministic() {
        let called = vec![fixture_snp()];
        let truth = vec![TruthVariant::new(fixture_snp(), TruthProvenance::TruthVcf)];
        let outcomes = match_variants(&called, &truth, MatchConfig::default()).unwrap();

        let dir = std::env::temp_dir();
        let fn1 = dir.join("varify_summary_test_1.tsv");
        let fn2 = dir.join("varify_summary_test_2.tsv");

        for filename in [&fn1, &fn2] {
            let mut writer = SummaryWriter::new("verify".to_string());
            writer.add_outcomes(&outcomes);
            writer.write_summary(filename).unwrap();
        }

        let bytes1 = std::fs::read(&fn1).unwrap();
        let bytes2 = std::fs::read(&fn2).unwrap();
        assert_eq!(bytes1, bytes2);

        // undefined metrics must serialize as empty fields, not zeros
        let text = String::from_utf8(bytes1).unwrap();
        assert!(text.starts_with("verify_label\tscope\tcategory\ttruth_total"));
        assert!(text.contains("\t1.0\t") || text.contains("\t1\t"));

        std::fs::remove_file(&fn1).ok();
        std::fs::remove_file(&fn2).ok();
    }

    #[test]
    fn test_undefined_rates_serialize_empty() {
        // a lone false positive: recall has a zero denominator and must stay empty
        let variant = fixture_snp();
        let outcome = MatchOutcome::new(VariantSource::Query, Classification::FalsePositive, variant, None).unwrap();

        let mut writer = SummaryWriter::new("verify".to_string());
        writer.add_outcomes(&[outcome]);

        let filename = std::env::temp_dir().join("varify_summary_test_undefined.tsv");
        writer.write_summary(&filename).unwrap();
        let text = std::fs::read_to_string(&filename).unwrap();
        std::fs::remove_file(&filename).ok();

        let all_row: Vec<&str> = text.lines().nth(1).unwrap().split('\t').collect();
        // metric_recall, metric_precision, metric_f1 are the last three columns
        assert_eq!(all_row[all_row.len()-3], "");
        assert_eq!(all_row[all_row.len()-2], "0.0");
        assert_eq!(all_row[all_row.len()-1], "");
    }

    #[test]
    fn test_reference_pair_end_to_end() {
        use std::io::Cursor;
        use crate::normalize::normalize_record;
        use crate::parsing::vcf::parse_vcf_lines;
        use crate::truth_builder::truth_from_reference_pair;

        // one real SNP in the mutated reference, one spurious call
        let original = b"AAAAATAAAA";
        let mutated  = b"AAAAACAAAA";
        let truth = truth_from_reference_pair("ref.1", original, mutated).unwrap();
        assert_eq!(truth.len(), 1);

        let text = concat!(
            "##fileformat=VCFv4.2\n",
            "##contig=<ID=ref.1,length=10>\n",
            "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample\n",
            "ref.1\t6\t.\tT\tC\t.\tPASS\t.\tGT\t1/1\n",
            "ref.1\t2\t.\tA\tG\t.\tPASS\t.\tGT\t1/1\n"
        );
        let parsed = parse_vcf_lines(Cursor::new(text)).unwrap();
        let called: Vec<NormalizedVariant> = parsed.records().iter()
            .flat_map(|record| normalize_record(record, 0))
            .collect();
        assert_eq!(called.len(), 2);

        let outcomes = match_variants(&called, &truth, MatchConfig::default()).unwrap();
        let mut writer = SummaryWriter::new("verify".to_string());
        writer.add_defects(parsed.defects());
        writer.add_outcomes(&outcomes);

        let overall = writer.metrics().overall();
        assert_eq!(overall.truth_tp, 1);
        assert_eq!(overall.truth_fn, 0);
        assert_eq!(overall.query_tp, 1);
        assert_eq!(overall.query_fp, 1);
        assert_eq!(overall.recall(), Some(1.0));
        assert_eq!(overall.precision(), Some(0.5));

        let report = writer.build_run_report(parsed.records().len() as u64, called.len() as u64, truth.len() as u64);
        assert_eq!(report.malformed_records, 0);
        assert_eq!(report.called_variants, 2);
        assert_eq!(report.truth_variants, 1);
    }

    #[test]
    fn test_run_report_counts() {
        use crate::parsing::vcf::{DefectKind, RecordDefect};

        let mut writer = SummaryWriter::new("verify".to_string());
        writer.add_defects(&[
            RecordDefect::new(12, DefectKind::FieldCountMismatch, "short sample column".to_string()),
            RecordDefect::new(15, DefectKind::TypeMismatch, "bad DP".to_string()),
            RecordDefect::new(20, DefectKind::TypeMismatch, "bad QUAL".to_string())
        ]);
        writer.add_contig_error();

        let report = writer.build_run_report(10, 12, 11);
        assert_eq!(report.malformed_records, 3);
        assert_eq!(report.defect_counts.get("TYPE_MISMATCH"), Some(&2));
        assert_eq!(report.defect_counts.get("FIELD_COUNT_MISMATCH"), Some(&1));
        assert_eq!(report.error_contigs, 1);
    }
}
