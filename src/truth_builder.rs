
use anyhow::{bail, Context};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::data_types::call_record::Zygosity;
use crate::data_types::normalized_variant::{NormalizedVariant, TruthProvenance, TruthVariant};
use crate::normalize::normalize_record;
use crate::parsing::vcf::ParsedVcf;
use crate::util::sequence_alignment::{global_align_ops, AlignOp};

/// Builds a truth set from a pre-supplied truth VCF by normalizing its records.
/// # Arguments
/// * `parsed` - the parsed truth VCF
/// * `sample_index` - the sample column whose GT supplies truth zygosity
pub fn truth_from_vcf(parsed: &ParsedVcf, sample_index: usize) -> Vec<TruthVariant> {
    let mut truth: Vec<TruthVariant> = vec![];
    for record in parsed.records().iter() {
        for variant in normalize_record(record, sample_index) {
            truth.push(TruthVariant::new(variant, TruthProvenance::TruthVcf));
        }
    }
    truth
}

/// Derives the truth set for one contig from a pairwise alignment of the original and
/// mutated reference sequences. Each substitution becomes its own SNP; contiguous
/// insertion and deletion runs each become a single anchored event. This mirrors what a
/// correct caller, given perfect reads of the mutated sequence, would report.
/// The mutated sequence is haploid, so every derived variant is homozygous alternate.
/// # Arguments
/// * `contig` - the contig name to stamp on each variant
/// * `original` - the original reference sequence
/// * `mutated` - the mutated reference sequence
/// # Errors
/// * if a derived edit cannot be represented (empty spans), which indicates an alignment bug
pub fn truth_from_reference_pair(contig: &str, original: &[u8], mutated: &[u8]) -> anyhow::Result<Vec<TruthVariant>> {
    let ops = global_align_ops(original, mutated);
    debug!("{contig}: alignment produced {} ops", ops.len());

    let mut truth: Vec<TruthVariant> = vec![];
    // 0-based cursors into each sequence
    let mut orig_index: usize = 0;
    let mut mut_index: usize = 0;
    let mut op_index: usize = 0;

    while op_index < ops.len() {
        let op = ops[op_index];
        // length of the run of identical ops starting here
        let run_length = ops[op_index..].iter()
            .take_while(|&&o| o == op)
            .count();

        match op {
            AlignOp::Match => {
                orig_index += run_length;
                mut_index += run_length;
            },
            AlignOp::Mismatch => {
                // a clean SNP run: one variant per substituted base, never a block replacement
                for offset in 0..run_length {
                    let variant = NormalizedVariant::new(
                        contig.to_string(),
                        (orig_index + offset + 1) as u64,
                        vec![original[orig_index + offset]],
                        vec![mutated[mut_index + offset]],
                        Zygosity::HomozygousAlternate
                    )?;
                    truth.push(TruthVariant::new(variant, TruthProvenance::ReferenceDiff));
                }
                orig_index += run_length;
                mut_index += run_length;
            },
            AlignOp::Insertion => {
                // inserted bases anchor at the next unconsumed original base
                let inserted: Vec<u8> = mutated[mut_index..mut_index + run_length].to_vec();
                let variant = NormalizedVariant::new(
                    contig.to_string(),
                    (orig_index + 1) as u64,
                    vec![],
                    inserted,
                    Zygosity::HomozygousAlternate
                )?;
                truth.push(TruthVariant::new(variant, TruthProvenance::ReferenceDiff));
                mut_index += run_length;
            },
            AlignOp::Deletion => {
                let deleted: Vec<u8> = original[orig_index..orig_index + run_length].to_vec();
                let variant = NormalizedVariant::new(
                    contig.to_string(),
                    (orig_index + 1) as u64,
                    deleted,
                    vec![],
                    Zygosity::HomozygousAlternate
                )?;
                truth.push(TruthVariant::new(variant, TruthProvenance::ReferenceDiff));
                orig_index += run_length;
            }
        };

        op_index += run_length;
    }

    Ok(truth)
}

/// Derives the truth set from paired FASTA maps, one alignment per shared contig.
/// # Arguments
/// * `original` - contig name -> original reference sequence
/// * `mutated` - contig name -> mutated reference sequence
/// # Errors
/// * if the two files do not carry the same contig names
pub fn truth_from_reference_files(
    original: &IndexMap<String, Vec<u8>>,
    mutated: &IndexMap<String, Vec<u8>>
) -> anyhow::Result<Vec<TruthVariant>> {
    let original_names: Vec<&String> = original.keys().sorted().collect();
    let mutated_names: Vec<&String> = mutated.keys().sorted().collect();
    if original_names != mutated_names {
        bail!(
            "Original and mutated references carry different contigs: {:?} vs {:?}",
            original_names, mutated_names
        );
    }

    let mut truth: Vec<TruthVariant> = vec![];
    for name in original_names {
        let contig_truth = truth_from_reference_pair(name, &original[name], &mutated[name])
            .with_context(|| format!("Error while deriving truth for contig {name:?}:"))?;
        truth.extend(contig_truth);
    }
    Ok(truth)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use crate::data_types::normalized_variant::VariantClass;
    use crate::parsing::vcf::parse_vcf_lines;

    #[test]
    fn test_truth_from_vcf() {
        let text = concat!(
            "##fileformat=VCFv4.2\n",
            "##contig=<ID=ref.1,length=10000>\n",
            "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ttruth_sample\n",
            "ref.1\t100\t.\tT\tA\t.\tPASS\t.\tGT\t1/1\n",
            "ref.1\t700\t.\tAC\tAGC\t.\tPASS\t.\tGT\t0/1\n"
        );
        let parsed = parse_vcf_lines(Cursor::new(text)).unwrap();
        let truth = truth_from_vcf(&parsed, 0);

        assert_eq!(truth.len(), 2);
        assert_eq!(truth[0].provenance(), TruthProvenance::TruthVcf);
        assert_eq!(truth[0].variant().position(), 100);
        assert_eq!(truth[0].variant().class(), VariantClass::Snp);
        assert_eq!(truth[1].variant().position(), 701);
        assert_eq!(truth[1].variant().class(), VariantClass::Insertion);
    }

    #[test]
    fn test_derive_single_snp() {
        let original = b"AAAATAAAA";
        let mutated  = b"AAAACAAAA";
        let truth = truth_from_reference_pair("ref.1", original, mutated).unwrap();

        assert_eq!(truth.len(), 1);
        let variant = truth[0].variant();
        assert_eq!(variant.position(), 5);
        assert_eq!(variant.class(), VariantClass::Snp);
        assert_eq!(variant.reference(), b"T");
        assert_eq!(variant.alternate(), b"C");
        assert_eq!(truth[0].provenance(), TruthProvenance::ReferenceDiff);
        assert_eq!(variant.zygosity(), Zygosity::HomozygousAlternate);
    }

    #[test]
    fn test_derive_snp_run_splits() {
        // two adjacent substitutions must come out as two SNPs, not one MNP block
        let original = b"GGGGTTGGGG";
        let mutated  = b"GGGGCAGGGG";
        let truth = truth_from_reference_pair("ref.1", original, mutated).unwrap();

        assert_eq!(truth.len(), 2);
        assert_eq!(truth[0].variant().position(), 5);
        assert_eq!(truth[0].variant().reference(), b"T");
        assert_eq!(truth[0].variant().alternate(), b"C");
        assert_eq!(truth[1].variant().position(), 6);
        assert_eq!(truth[1].variant().reference(), b"T");
        assert_eq!(truth[1].variant().alternate(), b"A");
        assert!(truth.iter().all(|t| t.variant().class() == VariantClass::Snp));
    }

    #[test]
    fn test_derive_insertion_run() {
        let original = b"CCCCAACCCC";
        let mutated  = b"CCCCAGGACCCC";
        let truth = truth_from_reference_pair("ref.1", original, mutated).unwrap();

        assert_eq!(truth.len(), 1);
        let variant = truth[0].variant();
        assert_eq!(variant.class(), VariantClass::Insertion);
        assert_eq!(variant.alternate(), b"GG");
        assert_eq!(variant.reference(), b"");
    }

    #[test]
    fn test_derive_deletion_run() {
        let original = b"TTTTACGTTTT";
        let mutated  = b"TTTTATTTT";
        let truth = truth_from_reference_pair("ref.1", original, mutated).unwrap();

        assert_eq!(truth.len(), 1);
        let variant = truth[0].variant();
        assert_eq!(variant.class(), VariantClass::Deletion);
        assert_eq!(variant.reference(), b"CG");
        assert_eq!(variant.alternate(), b"");
        assert_eq!(variant.position(), 6);
    }

    #[test]
    fn test_derive_identical_sequences() {
        let truth = truth_from_reference_pair("ref.1", b"ACGTACGT", b"ACGTACGT").unwrap();
        assert!(truth.is_empty());
    }

    #[test]
    fn test_reference_files_contig_mismatch() {
        let original: IndexMap<String, Vec<u8>> = [("ref.1".to_string(), b"ACGT".to_vec())].into_iter().collect();
        let mutated: IndexMap<String, Vec<u8>> = [("ref.2".to_string(), b"ACGT".to_vec())].into_iter().collect();
        assert!(truth_from_reference_files(&original, &mutated).is_err());
    }

    #[test]
    fn test_reference_files_multi_contig() {
        let original: IndexMap<String, Vec<u8>> = [
            ("ref.1".to_string(), b"AAAATAAAA".to_vec()),
            ("ref.2".to_string(), b"CCCCCCCC".to_vec())
        ].into_iter().collect();
        let mutated: IndexMap<String, Vec<u8>> = [
            ("ref.1".to_string(), b"AAAACAAAA".to_vec()),
            ("ref.2".to_string(), b"CCCCCCCC".to_vec())
        ].into_iter().collect();

        let truth = truth_from_reference_files(&original, &mutated).unwrap();
        assert_eq!(truth.len(), 1);
        assert_eq!(truth[0].variant().contig(), "ref.1");
    }
}
