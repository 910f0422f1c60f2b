
use crate::data_types::call_record::Zygosity;

/// All the variant classes we currently distinguish
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, strum_macros::AsRefStr, strum_macros::EnumString)]
pub enum VariantClass {
    /// Trimmed REF and ALT are both length = 1
    #[strum(ascii_case_insensitive)]
    Snp=0,
    /// Trimmed REF is empty, ALT is not
    #[strum(ascii_case_insensitive)]
    Insertion,
    /// Trimmed ALT is empty, REF is not
    #[strum(ascii_case_insensitive)]
    Deletion,
    /// Anything else: MNPs and mixed substitution/indel edits
    #[strum(ascii_case_insensitive)]
    Complex // make sure Complex is always the last one in the list
}

impl VariantClass {
    /// Classifies a minimal (already trimmed) REF/ALT pair.
    /// Returns None when both spans are empty, which describes no edit at all.
    pub fn classify(reference: &[u8], alternate: &[u8]) -> Option<Self> {
        match (reference.len(), alternate.len()) {
            (0, 0) => None,
            (1, 1) => Some(VariantClass::Snp),
            (0, _) => Some(VariantClass::Insertion),
            (_, 0) => Some(VariantClass::Deletion),
            (_, _) => Some(VariantClass::Complex)
        }
    }

    /// Returns true for the classes where positional slack is meaningful
    pub fn is_length_changing(&self) -> bool {
        match self {
            VariantClass::Insertion |
            VariantClass::Deletion |
            VariantClass::Complex => true,
            VariantClass::Snp => false
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VariantError {
    #[error("reference and alternate spans are both empty")]
    EmptyEdit,
    #[error("anchor position must be >= 1")]
    ZeroPosition
}

/// A locus-anchored minimal edit derived from one ALT allele of a record.
/// Field order drives the derived ordering: contig first, then anchor position.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NormalizedVariant {
    /// Contig name
    contig: String,
    /// 1-based position of the first differing base
    position: u64,
    /// The variant class, derived from the trimmed spans
    class: VariantClass,
    /// Trimmed reference span; empty for insertions
    reference: Vec<u8>,
    /// Trimmed alternate span; empty for deletions
    alternate: Vec<u8>,
    /// Zygosity of the originating sample call, Unknown when no GT was available
    zygosity: Zygosity
}

impl NormalizedVariant {
    /// Creates a normalized variant from already-trimmed spans.
    /// # Arguments
    /// * `contig` - the contig name
    /// * `position` - 1-based anchor, the first differing base
    /// * `reference` - trimmed reference span
    /// * `alternate` - trimmed alternate span
    /// * `zygosity` - the originating sample call
    /// # Errors
    /// * if both spans are empty (no edit)
    /// * if the anchor position is 0
    pub fn new(contig: String, position: u64, reference: Vec<u8>, alternate: Vec<u8>, zygosity: Zygosity) -> Result<Self, VariantError> {
        let class = VariantClass::classify(&reference, &alternate)
            .ok_or(VariantError::EmptyEdit)?;
        if position == 0 {
            return Err(VariantError::ZeroPosition);
        }

        Ok(Self {
            contig,
            position,
            class,
            reference,
            alternate,
            zygosity
        })
    }

    /// The locus/allele identity used for exact matching, zygosity excluded
    pub fn match_key(&self) -> (&str, u64, VariantClass, &[u8], &[u8]) {
        (&self.contig, self.position, self.class, &self.reference, &self.alternate)
    }

    /// Returns true if the other variant describes the same edit content (spans), position aside
    pub fn same_edit(&self, other: &Self) -> bool {
        self.reference == other.reference && self.alternate == other.alternate
    }

    // getters
    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn class(&self) -> VariantClass {
        self.class
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn alternate(&self) -> &[u8] {
        &self.alternate
    }

    pub fn zygosity(&self) -> Zygosity {
        self.zygosity
    }
}

impl std::fmt::Display for NormalizedVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // empty spans render as "-" so deletions and insertions stay readable
        let reference = if self.reference.is_empty() { "-".to_string() } else { String::from_utf8_lossy(&self.reference).to_string() };
        let alternate = if self.alternate.is_empty() { "-".to_string() } else { String::from_utf8_lossy(&self.alternate).to_string() };
        write!(f, "{}:{} {}>{}", self.contig, self.position, reference, alternate)
    }
}

/// Where a truth variant came from
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, strum_macros::AsRefStr)]
pub enum TruthProvenance {
    /// Normalized out of a user-supplied truth VCF
    #[strum(serialize = "TRUTH_VCF")]
    TruthVcf,
    /// Derived from the pairwise alignment of an original and a mutated reference
    #[strum(serialize = "REFERENCE_DIFF")]
    ReferenceDiff
}

/// A truth-set entry: a normalized variant plus its provenance
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct TruthVariant {
    /// The normalized edit
    variant: NormalizedVariant,
    /// How this entry was established
    provenance: TruthProvenance
}

impl TruthVariant {
    /// Constructor
    pub fn new(variant: NormalizedVariant, provenance: TruthProvenance) -> Self {
        Self {
            variant, provenance
        }
    }

    // getters
    pub fn variant(&self) -> &NormalizedVariant {
        &self.variant
    }

    pub fn provenance(&self) -> TruthProvenance {
        self.provenance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_classify() {
        assert_eq!(VariantClass::classify(b"T", b"A"), Some(VariantClass::Snp));
        assert_eq!(VariantClass::classify(b"", b"G"), Some(VariantClass::Insertion));
        assert_eq!(VariantClass::classify(b"CG", b""), Some(VariantClass::Deletion));
        assert_eq!(VariantClass::classify(b"C", b"GT"), Some(VariantClass::Complex));
        assert_eq!(VariantClass::classify(b"AT", b"GC"), Some(VariantClass::Complex));
        assert_eq!(VariantClass::classify(b"", b""), None);
    }

    #[test]
    fn test_class_labels() {
        assert_eq!(VariantClass::Snp.as_ref(), "Snp");
        assert_eq!(VariantClass::from_str("snp").unwrap(), VariantClass::Snp);
        assert_eq!(VariantClass::from_str("Insertion").unwrap(), VariantClass::Insertion);
        assert!(VariantClass::from_str("inversion").is_err());
    }

    #[test]
    fn test_new_variant() {
        let variant = NormalizedVariant::new(
            "ref.1".to_string(), 100, b"T".to_vec(), b"A".to_vec(), Zygosity::HomozygousAlternate
        ).unwrap();
        assert_eq!(variant.class(), VariantClass::Snp);
        assert_eq!(variant.position(), 100);
        assert_eq!(format!("{variant}"), "ref.1:100 T>A");

        let insertion = NormalizedVariant::new(
            "ref.1".to_string(), 701, vec![], b"G".to_vec(), Zygosity::Unknown
        ).unwrap();
        assert_eq!(insertion.class(), VariantClass::Insertion);
        assert_eq!(format!("{insertion}"), "ref.1:701 ->G");

        assert!(NormalizedVariant::new("ref.1".to_string(), 100, vec![], vec![], Zygosity::Unknown).is_err());
        assert!(NormalizedVariant::new("ref.1".to_string(), 0, b"T".to_vec(), b"A".to_vec(), Zygosity::Unknown).is_err());
    }

    #[test]
    fn test_ordering() {
        let v1 = NormalizedVariant::new("ref.1".to_string(), 100, b"T".to_vec(), b"A".to_vec(), Zygosity::Unknown).unwrap();
        let v2 = NormalizedVariant::new("ref.1".to_string(), 700, b"C".to_vec(), b"G".to_vec(), Zygosity::Unknown).unwrap();
        let v3 = NormalizedVariant::new("ref.2".to_string(), 5, b"C".to_vec(), b"G".to_vec(), Zygosity::Unknown).unwrap();

        // contig first, then position
        let mut variants = vec![v3.clone(), v2.clone(), v1.clone()];
        variants.sort();
        assert_eq!(variants, vec![v1, v2, v3]);
    }

    #[test]
    fn test_same_edit() {
        let v1 = NormalizedVariant::new("ref.1".to_string(), 100, vec![], b"GG".to_vec(), Zygosity::Unknown).unwrap();
        let v2 = NormalizedVariant::new("ref.1".to_string(), 103, vec![], b"GG".to_vec(), Zygosity::Unknown).unwrap();
        let v3 = NormalizedVariant::new("ref.1".to_string(), 103, vec![], b"GC".to_vec(), Zygosity::Unknown).unwrap();
        assert!(v1.same_edit(&v2));
        assert!(!v1.same_edit(&v3));
    }
}
