
use indexmap::IndexMap;

/// The declared `Number` of values an INFO/FORMAT field carries
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldNumber {
    /// A fixed count, e.g. `Number=1`
    Count(usize),
    /// `Number=A`, one value per alternate allele
    PerAlternate,
    /// `Number=R`, one value per allele including the reference
    PerAllele,
    /// `Number=G`, one value per possible genotype
    PerGenotype,
    /// `Number=.`, an unconstrained count
    Variable
}

impl FieldNumber {
    /// Parses the `Number=` token from a header declaration
    /// # Arguments
    /// * `token` - the raw token, e.g. `"1"`, `"A"`, `"."`
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "A" => Some(FieldNumber::PerAlternate),
            "R" => Some(FieldNumber::PerAllele),
            "G" => Some(FieldNumber::PerGenotype),
            "." => Some(FieldNumber::Variable),
            t => t.parse::<usize>().ok().map(FieldNumber::Count)
        }
    }

    /// Returns the exact value count this declaration requires for a record with `alt_count` alternate alleles.
    /// Genotype-count and variable declarations are not enforced, so they return `None`.
    pub fn expected_count(&self, alt_count: usize) -> Option<usize> {
        match self {
            FieldNumber::Count(n) => Some(*n),
            FieldNumber::PerAlternate => Some(alt_count),
            FieldNumber::PerAllele => Some(alt_count + 1),
            FieldNumber::PerGenotype |
            FieldNumber::Variable => None
        }
    }
}

/// The declared `Type` of an INFO/FORMAT field
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    Integer,
    Float,
    Flag,
    Character,
    String
}

impl FieldType {
    /// Parses the `Type=` token from a header declaration
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Integer" => Some(FieldType::Integer),
            "Float" => Some(FieldType::Float),
            "Flag" => Some(FieldType::Flag),
            "Character" => Some(FieldType::Character),
            "String" => Some(FieldType::String),
            _ => None
        }
    }
}

/// A single `##INFO` or `##FORMAT` declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// The field ID, e.g. `GT` or `DP`
    id: String,
    /// Declared value count
    number: FieldNumber,
    /// Declared value type
    ty: FieldType,
    /// Free-text description from the header
    description: String
}

impl FieldDeclaration {
    /// Constructor
    pub fn new(id: String, number: FieldNumber, ty: FieldType, description: String) -> Self {
        Self {
            id, number, ty, description
        }
    }

    // getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn number(&self) -> FieldNumber {
        self.number
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Snapshot of everything a VCF header declares.
/// This is an explicit value threaded through parsing so per-contig processing stays re-entrant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMetadata {
    /// Declared INFO fields, in declaration order
    info: IndexMap<String, FieldDeclaration>,
    /// Declared FORMAT fields, in declaration order
    format: IndexMap<String, FieldDeclaration>,
    /// Declared FILTER IDs mapped to their descriptions
    filters: IndexMap<String, String>,
    /// Declared contigs mapped to their optional lengths
    contigs: IndexMap<String, Option<u64>>,
    /// Sample names from the `#CHROM` column header line, in column order
    sample_names: Vec<String>
}

impl HeaderMetadata {
    /// Registers an INFO declaration, returning the previous one if the ID was already declared
    pub fn insert_info(&mut self, declaration: FieldDeclaration) -> Option<FieldDeclaration> {
        self.info.insert(declaration.id().to_string(), declaration)
    }

    /// Registers a FORMAT declaration, returning the previous one if the ID was already declared
    pub fn insert_format(&mut self, declaration: FieldDeclaration) -> Option<FieldDeclaration> {
        self.format.insert(declaration.id().to_string(), declaration)
    }

    /// Registers a FILTER declaration
    pub fn insert_filter(&mut self, id: String, description: String) {
        self.filters.insert(id, description);
    }

    /// Registers a contig declaration
    pub fn insert_contig(&mut self, name: String, length: Option<u64>) {
        self.contigs.insert(name, length);
    }

    /// Stores the sample names parsed from the column header line
    pub fn set_sample_names(&mut self, sample_names: Vec<String>) {
        self.sample_names = sample_names;
    }

    /// Looks up an INFO declaration by ID
    pub fn info(&self, id: &str) -> Option<&FieldDeclaration> {
        self.info.get(id)
    }

    /// Looks up a FORMAT declaration by ID
    pub fn format(&self, id: &str) -> Option<&FieldDeclaration> {
        self.format.get(id)
    }

    /// Returns true if the contig was declared in the header.
    /// Headers with no contig declarations at all are treated as declaring nothing, see `has_contig_declarations`.
    pub fn has_contig(&self, name: &str) -> bool {
        self.contigs.contains_key(name)
    }

    /// Returns true if the header declared any contigs.
    /// Contig checking is only meaningful when at least one declaration exists.
    pub fn has_contig_declarations(&self) -> bool {
        !self.contigs.is_empty()
    }

    /// Returns the declared length for a contig, if one was given
    pub fn contig_length(&self, name: &str) -> Option<u64> {
        self.contigs.get(name).copied().flatten()
    }

    /// Finds the column index of a sample by name
    pub fn sample_index(&self, sample_name: &str) -> Option<usize> {
        self.sample_names.iter().position(|s| s == sample_name)
    }

    // getters
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn filters(&self) -> &IndexMap<String, String> {
        &self.filters
    }

    pub fn contigs(&self) -> &IndexMap<String, Option<u64>> {
        &self.contigs
    }
}
