
use anyhow::bail;

use crate::data_types::normalized_variant::NormalizedVariant;

/// Each outcome is anchored to the side its variant came from
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, strum_macros::AsRefStr)]
pub enum VariantSource {
    #[strum(serialize = "TRUTH")]
    Truth,
    #[strum(serialize = "QUERY")]
    Query
}

/// Classification of a single variant after matching
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, strum_macros::AsRefStr)]
pub enum Classification {
    /// Matched the other side on locus, allele, and (when required) zygosity
    #[strum(serialize = "TP")]
    TruePositive=0,
    /// A called variant with no truth match
    #[strum(serialize = "FP")]
    FalsePositive,
    /// A truth variant with no call match
    #[strum(serialize = "FN")]
    FalseNegative,
    /// Locus and allele matched but zygosity disagreed
    #[strum(serialize = "GT_MISMATCH")]
    GenotypeMismatch,
    /// Multiple candidate matches within tolerance; reported, never silently resolved
    #[strum(serialize = "AMBIGUOUS")]
    Ambiguous
}

/// The classification of one variant from one side of the comparison.
/// Produced by the matcher, then owned and consumed by the aggregation step.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    /// Which input the variant came from
    source: VariantSource,
    /// The assigned classification
    classification: Classification,
    /// The variant itself
    variant: NormalizedVariant,
    /// Positional distance to the matched partner, when one exists
    match_distance: Option<u64>
}

impl MatchOutcome {
    /// Constructor
    /// # Arguments
    /// * `source` - which input the variant came from
    /// * `classification` - the assigned classification
    /// * `variant` - the variant being classified
    /// * `match_distance` - positional distance to the matched partner, when one exists
    /// # Errors
    /// * if the classification is impossible for the source (FP from truth, FN from query)
    pub fn new(
        source: VariantSource, classification: Classification,
        variant: NormalizedVariant, match_distance: Option<u64>
    ) -> anyhow::Result<Self> {
        match (source, classification) {
            (VariantSource::Truth, Classification::FalsePositive) => {
                bail!("truth variants cannot be false positives");
            },
            (VariantSource::Query, Classification::FalseNegative) => {
                bail!("query variants cannot be false negatives");
            },
            _ => {}
        };

        Ok(Self {
            source,
            classification,
            variant,
            match_distance
        })
    }

    // getters
    pub fn source(&self) -> VariantSource {
        self.source
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn variant(&self) -> &NormalizedVariant {
        &self.variant
    }

    pub fn match_distance(&self) -> Option<u64> {
        self.match_distance
    }
}
