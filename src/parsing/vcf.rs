
use anyhow::{bail, ensure, Context};
use log::debug;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::data_types::call_record::{CallRecord, InfoValue};
use crate::data_types::header_metadata::{FieldDeclaration, FieldNumber, FieldType, HeaderMetadata};

/// CHROM through FORMAT
const FIXED_COLUMNS: usize = 9;
/// Expected names on the `#CHROM` column header line
const FIXED_COLUMN_NAMES: [&str; FIXED_COLUMNS] = [
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT"
];

/// Classes of line-scoped defects the parser quarantines without aborting the stream
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, strum_macros::AsRefStr)]
pub enum DefectKind {
    /// Column counts or FORMAT/sample sub-field counts disagree
    #[strum(serialize = "FIELD_COUNT_MISMATCH")]
    FieldCountMismatch,
    /// A value does not parse under its declared Type/Number
    #[strum(serialize = "TYPE_MISMATCH")]
    TypeMismatch,
    /// An INFO/FORMAT key with no header declaration
    #[strum(serialize = "UNDECLARED_KEY")]
    UndeclaredKey,
    /// A data row on a contig the header never declared
    #[strum(serialize = "UNDECLARED_CONTIG")]
    UndeclaredContig
}

/// A quarantined data row plus the reason it was rejected.
/// These never reach normalization; they are collected and surfaced at the end of the run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordDefect {
    /// 1-based line number in the input
    line_number: usize,
    /// The defect class
    kind: DefectKind,
    /// Human-readable detail
    message: String
}

impl RecordDefect {
    /// Constructor
    pub fn new(line_number: usize, kind: DefectKind, message: String) -> Self {
        Self {
            line_number, kind, message
        }
    }

    // getters
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn kind(&self) -> DefectKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for RecordDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}: {}", self.line_number, self.kind.as_ref(), self.message)
    }
}

/// Everything pulled out of one VCF: the header snapshot, the accepted records, and the quarantined defects
#[derive(Clone, Debug, Default)]
pub struct ParsedVcf {
    /// The typed header snapshot
    header: HeaderMetadata,
    /// Accepted data rows, in input order
    records: Vec<CallRecord>,
    /// Quarantined data rows
    defects: Vec<RecordDefect>
}

impl ParsedVcf {
    // getters
    pub fn header(&self) -> &HeaderMetadata {
        &self.header
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn defects(&self) -> &[RecordDefect] {
        &self.defects
    }
}

/// Opens a VCF for buffered reading, decompressing when the filename ends with .gz
/// # Arguments
/// * `filename` - the file path to open
/// # Errors
/// * if the file cannot be opened
pub fn open_vcf(filename: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn BufRead> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Parses a whole VCF file from disk.
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file cannot be opened or read
/// * if the header itself is malformed (structural defects in data rows are collected, not raised)
pub fn parse_vcf_path(filename: &Path) -> anyhow::Result<ParsedVcf> {
    let reader = open_vcf(filename)?;
    parse_vcf_lines(reader)
        .with_context(|| format!("Error while parsing {filename:?}:"))
}

/// Parses a stream of VCF text lines into a header snapshot, accepted records, and quarantined defects.
/// Line-scoped defects never abort the stream; header problems do.
/// # Arguments
/// * `reader` - the line source
/// # Errors
/// * on I/O failures
/// * if a header declaration is malformed or the `#CHROM` column header line is missing
pub fn parse_vcf_lines<R: BufRead>(reader: R) -> anyhow::Result<ParsedVcf> {
    let mut header = HeaderMetadata::default();
    let mut records: Vec<CallRecord> = vec![];
    let mut defects: Vec<RecordDefect> = vec![];
    let mut saw_column_header = false;

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line
            .with_context(|| format!("Error while reading line {line_number}:"))?;

        if let Some(meta) = line.strip_prefix("##") {
            parse_meta_line(meta, &mut header)
                .with_context(|| format!("Error while parsing header line {line_number}:"))?;
        } else if line.starts_with('#') {
            parse_column_header(&line, &mut header)
                .with_context(|| format!("Error while parsing column header line {line_number}:"))?;
            saw_column_header = true;
        } else if line.trim().is_empty() {
            continue;
        } else {
            if !saw_column_header {
                bail!("Data row on line {line_number} appears before the #CHROM column header");
            }
            match parse_data_row(&line, &header) {
                Ok(record) => records.push(record),
                Err((kind, message)) => {
                    let defect = RecordDefect::new(line_number, kind, message);
                    debug!("Quarantined record: {defect}");
                    defects.push(defect);
                }
            };
        }
    }

    ensure!(saw_column_header, "VCF has no #CHROM column header line");

    Ok(ParsedVcf {
        header,
        records,
        defects
    })
}

/// Parses one `##`-prefixed metadata line (prefix already stripped) into the header snapshot.
/// Unrecognized keys pass through untouched.
fn parse_meta_line(meta: &str, header: &mut HeaderMetadata) -> anyhow::Result<()> {
    if let Some(body) = strip_structured(meta, "INFO") {
        header.insert_info(parse_field_declaration(body)?);
    } else if let Some(body) = strip_structured(meta, "FORMAT") {
        header.insert_format(parse_field_declaration(body)?);
    } else if let Some(body) = strip_structured(meta, "FILTER") {
        let fields = split_structured_fields(body);
        let id = find_field(&fields, "ID")
            .ok_or_else(|| anyhow::anyhow!("FILTER declaration is missing an ID"))?;
        let description = find_field(&fields, "Description").unwrap_or_default();
        header.insert_filter(id, description);
    } else if let Some(body) = strip_structured(meta, "contig") {
        let fields = split_structured_fields(body);
        let id = find_field(&fields, "ID")
            .ok_or_else(|| anyhow::anyhow!("contig declaration is missing an ID"))?;
        let length = match find_field(&fields, "length") {
            Some(raw) => Some(raw.parse::<u64>()
                .with_context(|| format!("Invalid contig length {raw:?}"))?),
            None => None
        };
        header.insert_contig(id, length);
    }

    Ok(())
}

/// Strips `KEY=<` and the trailing `>` from a structured metadata line body
fn strip_structured<'a>(meta: &'a str, key: &str) -> Option<&'a str> {
    meta.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix("=<"))
        .and_then(|rest| rest.strip_suffix('>'))
}

/// Splits `ID=DP,Number=1,Type=Integer,Description="Total depth"` into key/value pairs,
/// respecting commas inside quoted values
fn split_structured_fields(body: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = vec![];
    let mut current = String::new();
    let mut in_quotes = false;
    for c in body.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(split_key_value(&current));
                current.clear();
            },
            _ => current.push(c)
        };
    }
    if !current.is_empty() {
        fields.push(split_key_value(&current));
    }
    fields
}

fn split_key_value(field: &str) -> (String, String) {
    match field.split_once('=') {
        Some((key, value)) => (key.to_string(), value.trim_matches('"').to_string()),
        None => (field.to_string(), String::new())
    }
}

fn find_field(fields: &[(String, String)], key: &str) -> Option<String> {
    fields.iter()
        .find(|(k, _v)| k == key)
        .map(|(_k, v)| v.clone())
}

/// Parses the body of an `##INFO` or `##FORMAT` declaration
fn parse_field_declaration(body: &str) -> anyhow::Result<FieldDeclaration> {
    let fields = split_structured_fields(body);
    let id = find_field(&fields, "ID")
        .ok_or_else(|| anyhow::anyhow!("Field declaration is missing an ID"))?;
    let raw_number = find_field(&fields, "Number")
        .ok_or_else(|| anyhow::anyhow!("Field declaration {id:?} is missing a Number"))?;
    let number = FieldNumber::parse(&raw_number)
        .ok_or_else(|| anyhow::anyhow!("Field declaration {id:?} has invalid Number {raw_number:?}"))?;
    let raw_type = find_field(&fields, "Type")
        .ok_or_else(|| anyhow::anyhow!("Field declaration {id:?} is missing a Type"))?;
    let ty = FieldType::parse(&raw_type)
        .ok_or_else(|| anyhow::anyhow!("Field declaration {id:?} has invalid Type {raw_type:?}"))?;
    let description = find_field(&fields, "Description").unwrap_or_default();

    Ok(FieldDeclaration::new(id, number, ty, description))
}

/// Parses the `#CHROM ...` column header line, capturing sample names
fn parse_column_header(line: &str, header: &mut HeaderMetadata) -> anyhow::Result<()> {
    let columns: Vec<&str> = line.split('\t').collect();

    // sample-free VCFs stop at INFO; everything else must carry FORMAT plus samples
    ensure!(columns.len() >= FIXED_COLUMNS - 1, "Column header has {} columns, expected at least {}", columns.len(), FIXED_COLUMNS - 1);
    for (found, expected) in columns.iter().zip(FIXED_COLUMN_NAMES.iter()) {
        ensure!(found == expected, "Column header has {found:?} where {expected:?} was expected");
    }
    ensure!(columns.len() != FIXED_COLUMNS, "Column header declares FORMAT but no sample columns");

    let sample_names: Vec<String> = columns.iter()
        .skip(FIXED_COLUMNS)
        .map(|s| s.to_string())
        .collect();
    header.set_sample_names(sample_names);
    Ok(())
}

/// Internal defect payload; the row loop attaches the line number
type RowError = (DefectKind, String);

/// Parses one data row against the header snapshot.
/// Any structural or type defect rejects the whole row; rows are never partially accepted.
fn parse_data_row(line: &str, header: &HeaderMetadata) -> Result<CallRecord, RowError> {
    let columns: Vec<&str> = line.split('\t').collect();
    let sample_count = header.sample_names().len();
    let expected_columns = if sample_count == 0 { FIXED_COLUMNS - 1 } else { FIXED_COLUMNS + sample_count };
    if columns.len() != expected_columns {
        return Err((
            DefectKind::FieldCountMismatch,
            format!("expected {expected_columns} tab-separated columns, found {}", columns.len())
        ));
    }

    let contig = columns[0];
    if header.has_contig_declarations() && !header.has_contig(contig) {
        return Err((
            DefectKind::UndeclaredContig,
            format!("contig {contig:?} is not declared in the header")
        ));
    }

    let position: u64 = columns[1].parse()
        .map_err(|_| (DefectKind::TypeMismatch, format!("POS {:?} is not a positive integer", columns[1])))?;
    if position == 0 {
        return Err((DefectKind::TypeMismatch, "POS must be 1-based".to_string()));
    }

    let id = match columns[2] {
        "." => None,
        other => Some(other.to_string())
    };

    let reference = columns[3];
    if reference.is_empty() || reference == "." {
        return Err((DefectKind::TypeMismatch, "REF allele is missing".to_string()));
    }

    let alternates: Vec<String> = match columns[4] {
        "." => vec![],
        other => other.split(',').map(|s| s.to_string()).collect()
    };

    let quality: Option<f64> = match columns[5] {
        "." => None,
        other => Some(other.parse()
            .map_err(|_| (DefectKind::TypeMismatch, format!("QUAL {other:?} is not numeric")))?)
    };

    let filters: Vec<String> = match columns[6] {
        "." => vec![],
        other => other.split(';').map(|s| s.to_string()).collect()
    };

    let info = parse_info_field(columns[7], alternates.len(), header)?;

    let (format_keys, samples) = if sample_count > 0 {
        let format_keys: Vec<String> = match columns[8] {
            "." => vec![],
            other => other.split(':').map(|s| s.to_string()).collect()
        };
        for key in format_keys.iter() {
            if header.format(key).is_none() {
                return Err((
                    DefectKind::UndeclaredKey,
                    format!("FORMAT key {key:?} is not declared in the header")
                ));
            }
        }

        let mut samples: Vec<IndexMap<String, String>> = Vec::with_capacity(sample_count);
        for (sample_index, raw_sample) in columns[FIXED_COLUMNS..].iter().enumerate() {
            // a bare "." sample column means no data for this sample
            if *raw_sample == "." {
                samples.push(IndexMap::new());
                continue;
            }

            let values: Vec<&str> = raw_sample.split(':').collect();
            if values.len() != format_keys.len() {
                return Err((
                    DefectKind::FieldCountMismatch,
                    format!(
                        "FORMAT declares {} keys but sample #{sample_index} has {} values",
                        format_keys.len(), values.len()
                    )
                ));
            }

            let sample: IndexMap<String, String> = format_keys.iter()
                .zip(values.iter())
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            samples.push(sample);
        }

        (format_keys, samples)
    } else {
        (vec![], vec![])
    };

    Ok(CallRecord::new(
        contig.to_string(), position, id,
        reference.to_string(), alternates,
        quality, filters,
        info,
        format_keys, samples
    ))
}

/// Parses the INFO column against the declared Type and Number of each key
fn parse_info_field(raw: &str, alt_count: usize, header: &HeaderMetadata) -> Result<IndexMap<String, InfoValue>, RowError> {
    let mut info: IndexMap<String, InfoValue> = IndexMap::new();
    if raw == "." || raw.is_empty() {
        return Ok(info);
    }

    for entry in raw.split(';') {
        if entry.is_empty() {
            continue;
        }
        let (key, raw_value) = match entry.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (entry, None)
        };

        let declaration = header.info(key)
            .ok_or_else(|| (
                DefectKind::UndeclaredKey,
                format!("INFO key {key:?} is not declared in the header")
            ))?;

        let value = parse_info_value(declaration, raw_value, alt_count)?;
        info.insert(key.to_string(), value);
    }

    Ok(info)
}

/// Parses one INFO value under its declaration, enforcing Type and any fixed Number
fn parse_info_value(declaration: &FieldDeclaration, raw_value: Option<&str>, alt_count: usize) -> Result<InfoValue, RowError> {
    let id = declaration.id();

    // flags carry no value, everything else requires one
    if declaration.ty() == FieldType::Flag {
        return match raw_value {
            None => Ok(InfoValue::Flag),
            Some(v) => Err((
                DefectKind::TypeMismatch,
                format!("INFO flag {id:?} must not carry a value, found {v:?}")
            ))
        };
    }
    let raw = raw_value.ok_or_else(|| (
        DefectKind::TypeMismatch,
        format!("INFO key {id:?} of type {:?} requires a value", declaration.ty())
    ))?;

    let tokens: Vec<&str> = raw.split(',').collect();
    if let Some(expected) = declaration.number().expected_count(alt_count) {
        if tokens.len() != expected {
            return Err((
                DefectKind::TypeMismatch,
                format!("INFO key {id:?} declares {expected} value(s) but carries {}", tokens.len())
            ));
        }
    }

    let is_scalar = declaration.number() == FieldNumber::Count(1);
    match declaration.ty() {
        FieldType::Integer => {
            let parsed: Result<Vec<i64>, _> = tokens.iter().map(|t| t.parse::<i64>()).collect();
            let values = parsed.map_err(|_| (
                DefectKind::TypeMismatch,
                format!("INFO key {id:?} expects Integer value(s), found {raw:?}")
            ))?;
            if is_scalar {
                Ok(InfoValue::Integer(values[0]))
            } else {
                Ok(InfoValue::IntegerList(values))
            }
        },
        FieldType::Float => {
            let parsed: Result<Vec<f64>, _> = tokens.iter().map(|t| t.parse::<f64>()).collect();
            let values = parsed.map_err(|_| (
                DefectKind::TypeMismatch,
                format!("INFO key {id:?} expects Float value(s), found {raw:?}")
            ))?;
            if is_scalar {
                Ok(InfoValue::Float(values[0]))
            } else {
                Ok(InfoValue::FloatList(values))
            }
        },
        FieldType::Character |
        FieldType::String => {
            if is_scalar {
                Ok(InfoValue::String(tokens[0].to_string()))
            } else {
                Ok(InfoValue::StringList(tokens.iter().map(|t| t.to_string()).collect()))
            }
        },
        // handled above
        FieldType::Flag => unreachable!()
    }
}
