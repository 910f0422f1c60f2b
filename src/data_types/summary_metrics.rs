
use std::ops::AddAssign;

use crate::data_types::match_outcome::{Classification, MatchOutcome, VariantSource};

/// High-level summary metrics we expect to use frequently
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SummaryMetrics {
    /// Number of truth entries found in the calls
    pub truth_tp: u64,
    /// Number of truth entries missing from the calls
    pub truth_fn: u64,
    /// Number of called entries that match truth
    pub query_tp: u64,
    /// Number of called entries that are not in truth
    pub query_fp: u64,
    /// Truth entries whose locus/allele matched but whose zygosity disagreed
    pub truth_gt_mismatch: u64,
    /// Called entries whose locus/allele matched but whose zygosity disagreed
    pub query_gt_mismatch: u64,
    /// Truth entries with multiple unresolved candidate matches
    pub truth_ambiguous: u64,
    /// Called entries with multiple unresolved candidate matches
    pub query_ambiguous: u64
}

impl AddAssign for SummaryMetrics {
    // Enables += with stats
    fn add_assign(&mut self, rhs: Self) {
        self.truth_tp += rhs.truth_tp;
        self.truth_fn += rhs.truth_fn;
        self.query_tp += rhs.query_tp;
        self.query_fp += rhs.query_fp;
        self.truth_gt_mismatch += rhs.truth_gt_mismatch;
        self.query_gt_mismatch += rhs.query_gt_mismatch;
        self.truth_ambiguous += rhs.truth_ambiguous;
        self.query_ambiguous += rhs.query_ambiguous;
    }
}

impl SummaryMetrics {
    /// Constructor for the four core counters; mismatch/ambiguous counters start at zero
    pub fn new(truth_tp: u64, truth_fn: u64, query_tp: u64, query_fp: u64) -> Self {
        Self {
            truth_tp, truth_fn, query_tp, query_fp,
            ..Default::default()
        }
    }

    /// Folds one match outcome into the counters
    /// # Arguments
    /// * `outcome` - the outcome to count, routed by source and classification
    pub fn add_outcome(&mut self, outcome: &MatchOutcome) {
        match (outcome.source(), outcome.classification()) {
            (VariantSource::Truth, Classification::TruePositive) => self.truth_tp += 1,
            (VariantSource::Truth, Classification::FalseNegative) => self.truth_fn += 1,
            (VariantSource::Truth, Classification::GenotypeMismatch) => self.truth_gt_mismatch += 1,
            (VariantSource::Truth, Classification::Ambiguous) => self.truth_ambiguous += 1,
            (VariantSource::Query, Classification::TruePositive) => self.query_tp += 1,
            (VariantSource::Query, Classification::FalsePositive) => self.query_fp += 1,
            (VariantSource::Query, Classification::GenotypeMismatch) => self.query_gt_mismatch += 1,
            (VariantSource::Query, Classification::Ambiguous) => self.query_ambiguous += 1,
            // these two are rejected at MatchOutcome construction
            (VariantSource::Truth, Classification::FalsePositive) |
            (VariantSource::Query, Classification::FalseNegative) => {}
        }
    }

    /// Calculates recall if it can, which is relative to truth.
    /// A zero denominator reports as None (undefined), never as zero.
    pub fn recall(&self) -> Option<f64> {
        let denom = self.truth_tp + self.truth_fn;
        if denom > 0 {
            Some(self.truth_tp as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Calculates precision if it can, which is relative to the calls.
    /// A zero denominator reports as None (undefined), never as zero.
    pub fn precision(&self) -> Option<f64> {
        let denom = self.query_tp + self.query_fp;
        if denom > 0 {
            Some(self.query_tp as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Calculates F1 score if possible
    pub fn f1(&self) -> Option<f64> {
        if let (Some(recall), Some(precision)) = (self.recall(), self.precision()) {
            Some(2.0 * recall * precision / (recall + precision))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    use crate::data_types::call_record::Zygosity;
    use crate::data_types::normalized_variant::NormalizedVariant;

    #[test]
    fn test_scores() {
        let summary = SummaryMetrics { truth_tp: 10, truth_fn: 2, query_tp: 7, query_fp: 5, ..Default::default() };
        assert_approx_eq!(summary.recall().unwrap(), 10.0 / 12.0);
        assert_approx_eq!(summary.precision().unwrap(), 7.0 / 12.0);
        assert_approx_eq!(summary.f1().unwrap(), 2.0 * (10.0 / 12.0) * (7.0 / 12.0) / (17.0 / 12.0));
    }

    #[test]
    fn test_zero_denominators() {
        let empty = SummaryMetrics::default();
        assert_eq!(empty.recall(), None);
        assert_eq!(empty.precision(), None);
        assert_eq!(empty.f1(), None);

        // one side populated still leaves the other undefined
        let truth_only = SummaryMetrics::new(1, 1, 0, 0);
        assert_approx_eq!(truth_only.recall().unwrap(), 0.5);
        assert_eq!(truth_only.precision(), None);
        assert_eq!(truth_only.f1(), None);
    }

    #[test]
    fn test_add_assign() {
        let mut summary = SummaryMetrics { truth_tp: 10, truth_fn: 2, query_tp: 3, query_fp: 4, truth_gt_mismatch: 1, ..Default::default() };
        let summary2 = SummaryMetrics { truth_tp: 3, truth_fn: 1, query_tp: 10, query_fp: 2, query_ambiguous: 2, ..Default::default() };
        summary += summary2;
        assert_eq!(summary, SummaryMetrics {
            truth_tp: 13, truth_fn: 3, query_tp: 13, query_fp: 6,
            truth_gt_mismatch: 1, query_gt_mismatch: 0,
            truth_ambiguous: 0, query_ambiguous: 2
        });
    }

    #[test]
    fn test_add_outcome() {
        let variant = NormalizedVariant::new(
            "ref.1".to_string(), 100, b"T".to_vec(), b"A".to_vec(), Zygosity::Heterozygous
        ).unwrap();

        let mut summary = SummaryMetrics::default();
        summary.add_outcome(&MatchOutcome::new(VariantSource::Truth, Classification::TruePositive, variant.clone(), Some(0)).unwrap());
        summary.add_outcome(&MatchOutcome::new(VariantSource::Query, Classification::TruePositive, variant.clone(), Some(0)).unwrap());
        summary.add_outcome(&MatchOutcome::new(VariantSource::Query, Classification::FalsePositive, variant.clone(), None).unwrap());
        summary.add_outcome(&MatchOutcome::new(VariantSource::Truth, Classification::FalseNegative, variant.clone(), None).unwrap());
        summary.add_outcome(&MatchOutcome::new(VariantSource::Query, Classification::GenotypeMismatch, variant.clone(), Some(0)).unwrap());
        summary.add_outcome(&MatchOutcome::new(VariantSource::Truth, Classification::Ambiguous, variant, None).unwrap());

        assert_eq!(summary, SummaryMetrics {
            truth_tp: 1, truth_fn: 1, query_tp: 1, query_fp: 1,
            truth_gt_mismatch: 0, query_gt_mismatch: 1,
            truth_ambiguous: 1, query_ambiguous: 0
        });
    }
}
