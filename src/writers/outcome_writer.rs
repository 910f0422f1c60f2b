
use itertools::Itertools;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::match_outcome::MatchOutcome;
use crate::parsing::vcf::RecordDefect;

/// One row per variant per side in the per-variant outcome table
#[derive(Serialize)]
struct OutcomeRow {
    contig: String,
    position: u64,
    variant_class: String,
    reference: String,
    alternate: String,
    zygosity: String,
    source: String,
    classification: String,
    /// Positional distance to the matched partner; empty when unmatched
    match_distance: Option<u64>
}

impl OutcomeRow {
    fn new(outcome: &MatchOutcome) -> Self {
        let variant = outcome.variant();
        Self {
            contig: variant.contig().to_string(),
            position: variant.position(),
            variant_class: format!("{:?}", variant.class()),
            reference: render_span(variant.reference()),
            alternate: render_span(variant.alternate()),
            zygosity: format!("{:?}", variant.zygosity()),
            source: outcome.source().as_ref().to_string(),
            classification: outcome.classification().as_ref().to_string(),
            match_distance: outcome.match_distance()
        }
    }
}

/// Empty spans render as "-" so insertion/deletion rows stay greppable
fn render_span(span: &[u8]) -> String {
    if span.is_empty() {
        "-".to_string()
    } else {
        String::from_utf8_lossy(span).to_string()
    }
}

/// Writes the per-variant outcome table, sorted by contig name, position, then source,
/// so repeated runs on identical input produce byte-identical files.
/// # Arguments
/// * `outcomes` - the full outcome sequence from all contigs
/// * `filename` - the filename for the output (tsv/csv)
pub fn write_variant_outcomes(outcomes: &[MatchOutcome], filename: &Path) -> csv::Result<()> {
    let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)?;

    let ordered = outcomes.iter()
        .sorted_by_key(|o| (
            o.variant().contig().to_string(),
            o.variant().position(),
            o.source(),
            o.variant().alternate().to_vec(),
            o.classification()
        ));
    for outcome in ordered {
        csv_writer.serialize(OutcomeRow::new(outcome))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// One row per quarantined record in the defect table
#[derive(Serialize)]
struct DefectRow {
    line_number: usize,
    kind: String,
    message: String
}

/// Writes the quarantined-record table, in input line order
/// # Arguments
/// * `defects` - the collected parse defects
/// * `filename` - the filename for the output (tsv/csv)
pub fn write_parse_defects(defects: &[RecordDefect], filename: &Path) -> csv::Result<()> {
    let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)?;

    for defect in defects.iter().sorted_by_key(|d| d.line_number()) {
        csv_writer.serialize(DefectRow {
            line_number: defect.line_number(),
            kind: defect.kind().as_ref().to_string(),
            message: defect.message().to_string()
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
