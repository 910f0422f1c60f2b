
use crate::data_types::call_record::CallRecord;
use crate::data_types::normalized_variant::NormalizedVariant;

/// Trims the longest shared suffix, then the longest shared prefix, off a REF/ALT pair.
/// Returns the anchor offset (bases consumed by the prefix) plus the minimal spans.
/// # Arguments
/// * `reference` - the full REF allele
/// * `alternate` - one full ALT allele
fn trim_alleles(reference: &[u8], alternate: &[u8]) -> (u64, Vec<u8>, Vec<u8>) {
    let mut ref_end = reference.len();
    let mut alt_end = alternate.len();
    while ref_end > 0 && alt_end > 0 && reference[ref_end-1] == alternate[alt_end-1] {
        ref_end -= 1;
        alt_end -= 1;
    }

    let mut start = 0;
    while start < ref_end && start < alt_end && reference[start] == alternate[start] {
        start += 1;
    }

    (start as u64, reference[start..ref_end].to_vec(), alternate[start..alt_end].to_vec())
}

/// Returns true for ALT alleles that do not describe a sequence edit we can anchor:
/// spanning deletions (`*`), symbolic alleles (`<DEL>` etc.), and missing values.
fn is_symbolic_alt(alternate: &str) -> bool {
    alternate == "*" || alternate == "." || alternate.starts_with('<')
}

/// Converts one record into its minimal, locus-anchored variants, one per ALT allele.
/// Multi-allelic records split; shared REF/ALT prefixes and suffixes trim away; the anchor
/// position moves to the first differing base. Symbolic ALTs and ALTs identical to REF
/// contribute nothing. Pure function: identical inputs always yield identical outputs.
/// # Arguments
/// * `record` - the parsed record to normalize
/// * `sample_index` - the sample column whose GT supplies per-allele zygosity
pub fn normalize_record(record: &CallRecord, sample_index: usize) -> Vec<NormalizedVariant> {
    let mut variants: Vec<NormalizedVariant> = Vec::with_capacity(record.alternates().len());

    for (alt_offset, alternate) in record.alternates().iter().enumerate() {
        if is_symbolic_alt(alternate) {
            continue;
        }

        let (anchor_offset, ref_span, alt_span) = trim_alleles(
            record.reference().as_bytes(),
            alternate.as_bytes()
        );

        let zygosity = record.zygosity_for_allele(sample_index, alt_offset + 1);
        match NormalizedVariant::new(
            record.contig().to_string(),
            record.position() + anchor_offset,
            ref_span,
            alt_span,
            zygosity
        ) {
            Ok(variant) => variants.push(variant),
            // an ALT identical to REF trims to an empty edit; those carry no call
            Err(_) => continue
        };
    }

    variants
}
