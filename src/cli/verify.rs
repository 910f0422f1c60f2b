
use anyhow::bail;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct VerifySettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    varify_version: String,

    /// Called variant file to verify (VCF)
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "calls-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub calls_vcf_filename: PathBuf,

    /// Truth variant call file (VCF); mutually exclusive with the reference-pair mode
    #[clap(short = 't')]
    #[clap(long = "truth-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub truth_vcf_filename: Option<PathBuf>,

    /// Original reference FASTA for the reference-pair truth derivation mode
    #[clap(long = "truth-reference")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub original_reference_filename: Option<PathBuf>,

    /// Mutated reference FASTA for the reference-pair truth derivation mode
    #[clap(long = "mutated-reference")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub mutated_reference_filename: Option<PathBuf>,

    /// Output directory containing the summary, outcome, and defect tables
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Optional verification label for the summary output
    #[clap(long = "verify-label")]
    #[clap(value_name = "LABEL")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "verify")]
    pub verify_label: String,

    /// The sample name to use in the calls VCF [default: first sample]
    #[clap(long = "sample")]
    #[clap(value_name = "SAMPLE")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "", hide_default_value = true)]
    pub sample: String,

    /// The sample name to use in the truth VCF [default: first sample]
    #[clap(long = "truth-sample")]
    #[clap(value_name = "SAMPLE")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "", hide_default_value = true)]
    pub truth_sample: String,

    /// Positional slack (bp) when pairing indel representations; 0 requires exact loci
    #[clap(long = "position-tolerance")]
    #[clap(value_name = "BP")]
    #[clap(help_heading = Some("Matching parameters"))]
    #[clap(default_value = "0")]
    pub position_tolerance: u64,

    /// Require zygosity agreement for a true positive; disagreements report as genotype mismatches
    #[clap(long = "genotype-aware")]
    #[clap(help_heading = Some("Matching parameters"))]
    pub genotype_aware: bool,

    /// Number of threads to use for per-contig matching
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_verify_settings(mut settings: VerifySettings) -> anyhow::Result<VerifySettings> {
    // hard code the version in
    settings.varify_version = FULL_VERSION.clone();
    info!("Varify version: {:?}", &settings.varify_version);
    info!("Sub-command: verify");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.calls_vcf_filename, "Calls VCF")?;
    check_optional_filename(settings.truth_vcf_filename.as_deref(), "Truth VCF")?;
    check_optional_filename(settings.original_reference_filename.as_deref(), "Original reference FASTA")?;
    check_optional_filename(settings.mutated_reference_filename.as_deref(), "Mutated reference FASTA")?;

    // exactly one truth mode must be selected
    let reference_pair_mode = settings.original_reference_filename.is_some() || settings.mutated_reference_filename.is_some();
    if settings.truth_vcf_filename.is_some() && reference_pair_mode {
        bail!("--truth-vcf and --truth-reference/--mutated-reference are mutually exclusive");
    }
    if settings.truth_vcf_filename.is_none() && !reference_pair_mode {
        bail!("A truth source is required: either --truth-vcf or --truth-reference with --mutated-reference");
    }
    if reference_pair_mode && (settings.original_reference_filename.is_none() || settings.mutated_reference_filename.is_none()) {
        bail!("Reference-pair mode requires both --truth-reference and --mutated-reference");
    }

    // dump stuff to the logger
    info!("\tCalls VCF: {:?}", &settings.calls_vcf_filename);
    if let Some(truth_vcf) = settings.truth_vcf_filename.as_deref() {
        info!("\tTruth VCF: {truth_vcf:?}");
    } else {
        info!("\tOriginal reference: {:?}", settings.original_reference_filename.as_deref().unwrap());
        info!("\tMutated reference: {:?}", settings.mutated_reference_filename.as_deref().unwrap());
    }

    // outputs
    info!("Outputs:");
    info!("\tVerify label: {:?}", &settings.verify_label);
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    // matching parameters
    info!("Matching parameters:");
    info!("\tPosition tolerance: {} bp", settings.position_tolerance);
    info!("\tGenotype-aware: {}", if settings.genotype_aware { "ENABLED" } else { "DISABLED" });

    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
