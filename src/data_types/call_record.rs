
use indexmap::IndexMap;

/// A typed INFO value, selected by the declared Type and Number.
/// Downstream code pattern-matches on these instead of probing strings.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    /// Boolean presence, e.g. an indel marker key
    Flag,
    Integer(i64),
    Float(f64),
    String(String),
    IntegerList(Vec<i64>),
    FloatList(Vec<f64>),
    StringList(Vec<String>)
}

/// Zygosity definitions, relative to a single alternate allele
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Zygosity {
    HomozygousReference=0,
    Heterozygous,
    HomozygousAlternate,
    Unknown // make sure Unknown is always the last one in the list
}

impl Zygosity {
    /// Returns true if this is a homozygous call, on either allele
    pub fn is_homozygous(&self) -> bool {
        match self {
            Zygosity::HomozygousReference |
            Zygosity::HomozygousAlternate => true,

            Zygosity::Heterozygous |
            Zygosity::Unknown => false
        }
    }

    /// Returns true if this is a heterozygous call
    pub fn is_heterozygous(&self) -> bool {
        matches!(self, Zygosity::Heterozygous)
    }
}

/// Derives the zygosity of one alternate allele from a raw GT value.
/// Both `/` and `|` separators are accepted; haploid calls fold into the homozygous states.
/// Any missing sub-field (`.`) makes the whole call Unknown.
/// # Arguments
/// * `gt` - the raw GT value, e.g. `"0/1"` or `"1|1"` or `"1"`
/// * `allele_index` - the 1-based index of the alternate allele of interest
pub fn zygosity_for_allele(gt: &str, allele_index: usize) -> Zygosity {
    let mut copies: usize = 0;
    let mut total: usize = 0;
    for token in gt.split(['/', '|']) {
        let Ok(called) = token.parse::<usize>() else {
            // "." or anything unparseable
            return Zygosity::Unknown;
        };
        if called == allele_index {
            copies += 1;
        }
        total += 1;
    }

    if total == 0 {
        Zygosity::Unknown
    } else if copies == 0 {
        Zygosity::HomozygousReference
    } else if copies == total {
        Zygosity::HomozygousAlternate
    } else {
        Zygosity::Heterozygous
    }
}

/// A fully parsed VCF data row. Immutable once constructed; validation happens at parse time.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRecord {
    /// Contig name from the CHROM column
    contig: String,
    /// 1-based coordinate from the POS column
    position: u64,
    /// Record ID; None when the column held `.`
    id: Option<String>,
    /// Reference allele
    reference: String,
    /// Ordered alternate alleles; empty when the column held `.`
    alternates: Vec<String>,
    /// Phred-scaled quality; None when the column held `.`
    quality: Option<f64>,
    /// FILTER tags; empty when the column held `.`
    filters: Vec<String>,
    /// Typed INFO values keyed by ID, in column order
    info: IndexMap<String, InfoValue>,
    /// FORMAT keys, in column order
    format_keys: Vec<String>,
    /// One map per sample column: FORMAT key -> raw value
    samples: Vec<IndexMap<String, String>>
}

impl CallRecord {
    /// Constructor
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contig: String, position: u64, id: Option<String>,
        reference: String, alternates: Vec<String>,
        quality: Option<f64>, filters: Vec<String>,
        info: IndexMap<String, InfoValue>,
        format_keys: Vec<String>, samples: Vec<IndexMap<String, String>>
    ) -> Self {
        Self {
            contig, position, id,
            reference, alternates,
            quality, filters,
            info,
            format_keys, samples
        }
    }

    /// Returns a raw FORMAT value for a sample, if present
    /// # Arguments
    /// * `sample_index` - index of the sample column
    /// * `key` - the FORMAT key, e.g. `GT`
    pub fn sample_value(&self, sample_index: usize, key: &str) -> Option<&str> {
        self.samples.get(sample_index)
            .and_then(|sample| sample.get(key))
            .map(|v| v.as_str())
    }

    /// Derives the zygosity of one alternate allele for a sample.
    /// Records with no GT value report Unknown.
    /// # Arguments
    /// * `sample_index` - index of the sample column
    /// * `allele_index` - the 1-based index of the alternate allele of interest
    pub fn zygosity_for_allele(&self, sample_index: usize, allele_index: usize) -> Zygosity {
        match self.sample_value(sample_index, "GT") {
            Some(gt) => zygosity_for_allele(gt, allele_index),
            None => Zygosity::Unknown
        }
    }

    /// Returns true if an INFO flag key is present on this record
    pub fn has_info_flag(&self, key: &str) -> bool {
        matches!(self.info.get(key), Some(InfoValue::Flag))
    }

    // getters
    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn info(&self) -> &IndexMap<String, InfoValue> {
        &self.info
    }

    pub fn format_keys(&self) -> &[String] {
        &self.format_keys
    }

    pub fn samples(&self) -> &[IndexMap<String, String>] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zygosity_for_allele() {
        assert_eq!(zygosity_for_allele("0/0", 1), Zygosity::HomozygousReference);
        assert_eq!(zygosity_for_allele("0/1", 1), Zygosity::Heterozygous);
        assert_eq!(zygosity_for_allele("1/1", 1), Zygosity::HomozygousAlternate);
        assert_eq!(zygosity_for_allele("1|0", 1), Zygosity::Heterozygous);
        assert_eq!(zygosity_for_allele("./.", 1), Zygosity::Unknown);
        assert_eq!(zygosity_for_allele(".", 1), Zygosity::Unknown);

        // haploid calls fold into the homozygous states
        assert_eq!(zygosity_for_allele("1", 1), Zygosity::HomozygousAlternate);
        assert_eq!(zygosity_for_allele("0", 1), Zygosity::HomozygousReference);

        // multi-allelic: 1/2 is heterozygous for both alternates
        assert_eq!(zygosity_for_allele("1/2", 1), Zygosity::Heterozygous);
        assert_eq!(zygosity_for_allele("1/2", 2), Zygosity::Heterozygous);
        assert_eq!(zygosity_for_allele("2/2", 1), Zygosity::HomozygousReference);
        assert_eq!(zygosity_for_allele("2/2", 2), Zygosity::HomozygousAlternate);
    }

    #[test]
    fn test_record_accessors() {
        let mut sample: IndexMap<String, String> = IndexMap::new();
        sample.insert("GT".to_string(), "0/1".to_string());
        sample.insert("GT_CONF".to_string(), "38.1".to_string());

        let record = CallRecord::new(
            "ref.1".to_string(), 100, None,
            "T".to_string(), vec!["A".to_string()],
            Some(42.0), vec!["PASS".to_string()],
            [("DP".to_string(), InfoValue::Integer(12))].into_iter().collect(),
            vec!["GT".to_string(), "GT_CONF".to_string()],
            vec![sample]
        );

        assert_eq!(record.contig(), "ref.1");
        assert_eq!(record.position(), 100);
        assert_eq!(record.sample_value(0, "GT"), Some("0/1"));
        assert_eq!(record.sample_value(0, "MISSING"), None);
        assert_eq!(record.sample_value(1, "GT"), None);
        assert_eq!(record.zygosity_for_allele(0, 1), Zygosity::Heterozygous);
        assert_eq!(record.info().get("DP"), Some(&InfoValue::Integer(12)));
        assert!(!record.has_info_flag("DP"));
    }
}
