
use std::collections::BTreeMap;
use std::ops::AddAssign;

use crate::data_types::match_outcome::MatchOutcome;
use crate::data_types::normalized_variant::VariantClass;
use crate::data_types::summary_metrics::SummaryMetrics;

/// Wrapper containing the overall SummaryMetrics plus the per-class and per-contig breakdowns.
/// BTreeMaps keep iteration deterministic for reporting.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GroupedMetrics {
    /// Stores the overall summary metrics
    overall: SummaryMetrics,
    /// Stores the per-variant-class breakdown
    by_class: BTreeMap<VariantClass, SummaryMetrics>,
    /// Stores the per-contig breakdown
    by_contig: BTreeMap<String, SummaryMetrics>
}

impl GroupedMetrics {
    /// Folds one match outcome into the overall, per-class, and per-contig counters
    /// # Arguments
    /// * `outcome` - the outcome to count
    pub fn add_outcome(&mut self, outcome: &MatchOutcome) {
        self.overall.add_outcome(outcome);

        let class_entry = self.by_class.entry(outcome.variant().class()).or_default();
        class_entry.add_outcome(outcome);

        let contig_entry = self.by_contig.entry(outcome.variant().contig().to_string()).or_default();
        contig_entry.add_outcome(outcome);
    }

    /// Folds a full outcome sequence, e.g. one contig batch
    pub fn add_outcomes(&mut self, outcomes: &[MatchOutcome]) {
        for outcome in outcomes.iter() {
            self.add_outcome(outcome);
        }
    }

    // getters
    pub fn overall(&self) -> &SummaryMetrics {
        &self.overall
    }

    pub fn by_class(&self) -> &BTreeMap<VariantClass, SummaryMetrics> {
        &self.by_class
    }

    pub fn by_contig(&self) -> &BTreeMap<String, SummaryMetrics> {
        &self.by_contig
    }

    /// Returns the metrics for one contig, if any outcomes landed there
    pub fn contig_metrics(&self, contig: &str) -> Option<&SummaryMetrics> {
        self.by_contig.get(contig)
    }
}

impl AddAssign<&Self> for GroupedMetrics {
    // Enables += for merging per-contig partial results into the final tally
    fn add_assign(&mut self, rhs: &Self) {
        self.overall += rhs.overall;

        for (&class, &metrics) in rhs.by_class.iter() {
            let entry = self.by_class.entry(class).or_default();
            *entry += metrics;
        }

        for (contig, &metrics) in rhs.by_contig.iter() {
            let entry = self.by_contig.entry(contig.clone()).or_default();
            *entry += metrics;
        }
    }
}

impl AddAssign<Self> for GroupedMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.add_assign(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::call_record::Zygosity;
    use crate::data_types::match_outcome::{Classification, VariantSource};
    use crate::data_types::normalized_variant::NormalizedVariant;

    fn build_outcome(contig: &str, position: u64, source: VariantSource, classification: Classification) -> MatchOutcome {
        let variant = NormalizedVariant::new(
            contig.to_string(), position, b"T".to_vec(), b"A".to_vec(), Zygosity::Heterozygous
        ).unwrap();
        MatchOutcome::new(source, classification, variant, None).unwrap()
    }

    #[test]
    fn test_add_outcome_routing() {
        let mut grouped = GroupedMetrics::default();
        grouped.add_outcome(&build_outcome("ref.1", 100, VariantSource::Query, Classification::TruePositive));
        grouped.add_outcome(&build_outcome("ref.1", 100, VariantSource::Truth, Classification::TruePositive));
        grouped.add_outcome(&build_outcome("ref.2", 50, VariantSource::Query, Classification::FalsePositive));

        assert_eq!(grouped.overall(), &SummaryMetrics::new(1, 0, 1, 1));
        assert_eq!(grouped.by_class().get(&VariantClass::Snp), Some(&SummaryMetrics::new(1, 0, 1, 1)));
        assert_eq!(grouped.contig_metrics("ref.1"), Some(&SummaryMetrics::new(1, 0, 1, 0)));
        assert_eq!(grouped.contig_metrics("ref.2"), Some(&SummaryMetrics::new(0, 0, 0, 1)));
        assert_eq!(grouped.contig_metrics("ref.3"), None);
    }

    #[test]
    fn test_grouped_add_assign() {
        let mut g1 = GroupedMetrics::default();
        g1.add_outcome(&build_outcome("ref.1", 100, VariantSource::Truth, Classification::FalseNegative));

        let mut g2 = GroupedMetrics::default();
        g2.add_outcome(&build_outcome("ref.1", 200, VariantSource::Query, Classification::TruePositive));
        g2.add_outcome(&build_outcome("ref.2", 10, VariantSource::Truth, Classification::TruePositive));

        g1 += &g2;
        assert_eq!(g1.overall(), &SummaryMetrics::new(1, 1, 1, 0));
        assert_eq!(g1.contig_metrics("ref.1"), Some(&SummaryMetrics::new(0, 1, 1, 0)));
        assert_eq!(g1.contig_metrics("ref.2"), Some(&SummaryMetrics::new(1, 0, 0, 0)));
    }
}
