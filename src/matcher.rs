
use derive_builder::Builder;
use itertools::Itertools;
use rustc_hash::FxHashMap as HashMap;

use crate::data_types::match_outcome::{Classification, MatchOutcome, VariantSource};
use crate::data_types::normalized_variant::{NormalizedVariant, TruthVariant, VariantClass};

/// Controls how called variants are paired against truth
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct MatchConfig {
    /// Maximum positional slack (bp) when pairing length-changing variants; 0 means exact loci only
    position_tolerance: u64,
    /// If true, a locus/allele match with disagreeing zygosity becomes a genotype mismatch instead of a true positive
    genotype_aware: bool
}

impl Default for MatchConfig {
    fn default() -> Self {
        // these settings are set to reasonable defaults for unit tests
        // main.rs will set each of them manually based on user input
        Self {
            position_tolerance: 0,
            genotype_aware: false
        }
    }
}

impl MatchConfig {
    // getters
    pub fn position_tolerance(&self) -> u64 {
        self.position_tolerance
    }

    pub fn genotype_aware(&self) -> bool {
        self.genotype_aware
    }
}

/// Assignment for one side of a formed pair
#[derive(Clone, Copy, Debug)]
struct Assignment {
    classification: Classification,
    match_distance: Option<u64>
}

/// Pairs called variants against truth variants and classifies every variant on both sides.
/// The returned outcomes partition both inputs: each called and each truth variant appears in
/// exactly one outcome. Called variants are processed in sorted order and ties are broken by
/// smallest positional distance, so results are deterministic and auditable.
/// # Arguments
/// * `called` - normalized called variants, any order
/// * `truth` - the truth set, any order
/// * `config` - matching configuration
/// # Errors
/// * if outcome assembly produces an impossible source/classification pairing (internal invariant)
pub fn match_variants(
    called: &[NormalizedVariant], truth: &[TruthVariant], config: MatchConfig
) -> anyhow::Result<Vec<MatchOutcome>> {
    // deterministic processing orders for both sides
    let called_order: Vec<usize> = (0..called.len())
        .sorted_by(|&a, &b| called[a].cmp(&called[b]))
        .collect();
    let truth_order: Vec<usize> = (0..truth.len())
        .sorted_by(|&a, &b| truth[a].variant().cmp(truth[b].variant()))
        .collect();

    // exact-locus index and per-contig positional index into the truth set
    let mut exact_index: HashMap<(&str, u64, VariantClass, &[u8], &[u8]), Vec<usize>> = Default::default();
    let mut contig_index: HashMap<&str, Vec<usize>> = Default::default();
    for &truth_idx in truth_order.iter() {
        let variant = truth[truth_idx].variant();
        exact_index.entry(variant.match_key()).or_default().push(truth_idx);
        contig_index.entry(variant.contig()).or_default().push(truth_idx);
    }

    let mut called_assignments: Vec<Option<Assignment>> = vec![None; called.len()];
    let mut truth_assignments: Vec<Option<Assignment>> = vec![None; truth.len()];

    for &called_idx in called_order.iter() {
        let variant = &called[called_idx];

        // exact locus/allele match first
        let exact_candidate = exact_index.get(&variant.match_key())
            .and_then(|candidates| pick_exact_candidate(candidates, &truth_assignments, truth, variant, config));
        if let Some(truth_idx) = exact_candidate {
            let classification = classify_pair(variant, &truth[truth_idx], config);
            called_assignments[called_idx] = Some(Assignment { classification, match_distance: Some(0) });
            truth_assignments[truth_idx] = Some(Assignment { classification, match_distance: Some(0) });
            continue;
        }

        // positional slack only applies to length-changing variants, and the edit content must still agree
        if config.position_tolerance > 0 && variant.class().is_length_changing() {
            let candidates: Vec<(u64, usize)> = contig_index.get(variant.contig())
                .map(|indices| {
                    indices.iter()
                        .filter(|&&truth_idx| truth_assignments[truth_idx].is_none())
                        .filter(|&&truth_idx| truth[truth_idx].variant().same_edit(variant))
                        .map(|&truth_idx| (variant.position().abs_diff(truth[truth_idx].variant().position()), truth_idx))
                        .filter(|&(distance, _)| distance <= config.position_tolerance)
                        .collect()
                })
                .unwrap_or_default();

            if let Some(&(best_distance, _)) = candidates.iter().min_by_key(|&&(distance, _)| distance) {
                let best: Vec<usize> = candidates.iter()
                    .filter(|&&(distance, _)| distance == best_distance)
                    .map(|&(_, truth_idx)| truth_idx)
                    .collect();

                if best.len() > 1 {
                    // matching content forces matching class, so distance ties cannot be broken
                    // by class preference; report them instead of picking arbitrarily
                    called_assignments[called_idx] = Some(Assignment {
                        classification: Classification::Ambiguous,
                        match_distance: None
                    });
                } else {
                    let truth_idx = best[0];
                    let classification = classify_pair(variant, &truth[truth_idx], config);
                    called_assignments[called_idx] = Some(Assignment { classification, match_distance: Some(best_distance) });
                    truth_assignments[truth_idx] = Some(Assignment { classification, match_distance: Some(best_distance) });
                }
                continue;
            }
        }

        // no truth support
        called_assignments[called_idx] = Some(Assignment {
            classification: Classification::FalsePositive,
            match_distance: None
        });
    }

    // assemble the partition: every called then every truth variant, in sorted order
    let mut outcomes: Vec<MatchOutcome> = Vec::with_capacity(called.len() + truth.len());
    for &called_idx in called_order.iter() {
        let assignment = called_assignments[called_idx].unwrap_or(Assignment {
            classification: Classification::FalsePositive,
            match_distance: None
        });
        outcomes.push(MatchOutcome::new(
            VariantSource::Query,
            assignment.classification,
            called[called_idx].clone(),
            assignment.match_distance
        )?);
    }
    for &truth_idx in truth_order.iter() {
        let assignment = truth_assignments[truth_idx].unwrap_or(Assignment {
            classification: Classification::FalseNegative,
            match_distance: None
        });
        outcomes.push(MatchOutcome::new(
            VariantSource::Truth,
            assignment.classification,
            truth[truth_idx].variant().clone(),
            assignment.match_distance
        )?);
    }

    Ok(outcomes)
}

/// Picks the exact-key candidate to pair with, favoring matching zygosity in genotype-aware mode
fn pick_exact_candidate(
    candidates: &[usize], truth_assignments: &[Option<Assignment>],
    truth: &[TruthVariant], variant: &NormalizedVariant, config: MatchConfig
) -> Option<usize> {
    let unmatched: Vec<usize> = candidates.iter()
        .copied()
        .filter(|&truth_idx| truth_assignments[truth_idx].is_none())
        .collect();

    if config.genotype_aware {
        if let Some(&truth_idx) = unmatched.iter().find(|&&truth_idx| truth[truth_idx].variant().zygosity() == variant.zygosity()) {
            return Some(truth_idx);
        }
    }
    unmatched.first().copied()
}

/// Classifies a formed pair: a true positive, unless genotype-aware mode finds disagreeing zygosity
fn classify_pair(variant: &NormalizedVariant, truth: &TruthVariant, config: MatchConfig) -> Classification {
    if config.genotype_aware && variant.zygosity() != truth.variant().zygosity() {
        Classification::GenotypeMismatch
    } else {
        Classification::TruePositive
    }
}
