
use anyhow::{ensure, Context};
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

/// Loads a FASTA file into an ordered contig -> sequence map.
/// Sequence names stop at the first whitespace; bases are upper-cased so truth derivation
/// never sees soft-masked/lower-case mismatches.
/// # Arguments
/// * `filename` - the FASTA path, plain or gzipped
/// # Errors
/// * if the file is missing, unreadable, or not FASTA/FASTQ
/// * if the file is empty or carries duplicate sequence names
pub fn load_fasta(filename: &Path) -> anyhow::Result<IndexMap<String, Vec<u8>>> {
    let mut reader = needletail::parse_fastx_file(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;

    let mut sequences: IndexMap<String, Vec<u8>> = IndexMap::new();
    while let Some(record) = reader.next() {
        let record = record
            .with_context(|| format!("Error while reading {filename:?}:"))?;
        let full_id = std::str::from_utf8(record.id())
            .with_context(|| format!("Non-UTF8 sequence name in {filename:?}"))?;
        let name = full_id.split_whitespace().next().unwrap_or(full_id).to_string();
        let sequence = record.seq().to_ascii_uppercase();

        debug!("Loaded {name} ({} bp) from {filename:?}", sequence.len());
        ensure!(
            sequences.insert(name.clone(), sequence).is_none(),
            "Duplicate sequence name {name:?} in {filename:?}"
        );
    }

    ensure!(!sequences.is_empty(), "No sequences found in {filename:?}");
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_fasta(name: &str, content: &str) -> std::path::PathBuf {
        let filename = std::env::temp_dir().join(name);
        let mut handle = std::fs::File::create(&filename).unwrap();
        handle.write_all(content.as_bytes()).unwrap();
        filename
    }

    #[test]
    fn test_load_fasta() {
        let filename = write_temp_fasta(
            "varify_reference_test.fa",
            ">ref.1 original sequence\nACGTacgt\nACGT\n>ref.2\nTTTT\n"
        );
        let sequences = load_fasta(&filename).unwrap();
        std::fs::remove_file(&filename).ok();

        assert_eq!(sequences.len(), 2);
        // name stops at whitespace, bases upper-cased, lines joined
        assert_eq!(sequences.get("ref.1").unwrap(), b"ACGTACGTACGT");
        assert_eq!(sequences.get("ref.2").unwrap(), b"TTTT");
    }

    #[test]
    fn test_load_fasta_duplicate_names() {
        let filename = write_temp_fasta(
            "varify_reference_dup_test.fa",
            ">ref.1\nACGT\n>ref.1\nTTTT\n"
        );
        let result = load_fasta(&filename);
        std::fs::remove_file(&filename).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_fasta_missing_file() {
        let filename = std::env::temp_dir().join("varify_reference_missing.fa");
        assert!(load_fasta(&filename).is_err());
    }
}
