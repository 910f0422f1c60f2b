
use anyhow::{anyhow, ensure};
use indicatif::ParallelProgressIterator;
use log::{LevelFilter, debug, error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;

use varify::cli::core::{Commands, get_cli};
use varify::cli::verify::{VerifySettings, check_verify_settings};
use varify::data_types::header_metadata::HeaderMetadata;
use varify::data_types::match_outcome::MatchOutcome;
use varify::data_types::normalized_variant::{NormalizedVariant, TruthVariant};
use varify::matcher::{MatchConfigBuilder, match_variants};
use varify::normalize::normalize_record;
use varify::parsing::reference::load_fasta;
use varify::parsing::vcf::parse_vcf_path;
use varify::truth_builder::{truth_from_reference_files, truth_from_vcf};
use varify::util::json_io::save_json;
use varify::util::progress_bar::get_progress_style;
use varify::writers::outcome_writer::{write_parse_defects, write_variant_outcomes};
use varify::writers::summary::SummaryWriter;

/// Resolves a user-provided sample name to a column index.
/// An empty name selects the first sample; sample-free VCFs resolve to index 0,
/// where GT lookups report Unknown zygosity.
fn resolve_sample_index(header: &HeaderMetadata, sample: &str, label: &str) -> anyhow::Result<usize> {
    if sample.is_empty() {
        Ok(0)
    } else {
        ensure!(!header.sample_names().is_empty(), "{label} VCF declares no samples but a sample name was requested");
        header.sample_index(sample)
            .ok_or(anyhow!("Sample name {sample:?} was not found in the {label} VCF"))
    }
}

fn run_verify(settings: VerifySettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_verify_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // create a debug folder if specified, files might get created in sub-routines
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // parse the calls VCF; line-scoped defects are collected, header problems are fatal
    info!("Parsing calls VCF...");
    let parsed_calls = match parse_vcf_path(&settings.calls_vcf_filename) {
        Ok(pv) => pv,
        Err(e) => {
            error!("Error while parsing calls VCF: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!(
        "Parsed {} records; {} quarantined as malformed.",
        parsed_calls.records().len(), parsed_calls.defects().len()
    );

    let sample_index = match resolve_sample_index(parsed_calls.header(), &settings.sample, "calls") {
        Ok(si) => si,
        Err(e) => {
            error!("Error while resolving sample: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // normalize everything that survived parsing
    let called_variants: Vec<NormalizedVariant> = parsed_calls.records().iter()
        .flat_map(|record| normalize_record(record, sample_index))
        .collect();
    info!("Normalized {} called variants.", called_variants.len());

    // build the truth set
    let truth_variants: Vec<TruthVariant> = if let Some(truth_vcf_fn) = settings.truth_vcf_filename.as_deref() {
        info!("Parsing truth VCF...");
        let parsed_truth = match parse_vcf_path(truth_vcf_fn) {
            Ok(pv) => pv,
            Err(e) => {
                error!("Error while parsing truth VCF: {e:#}");
                std::process::exit(exitcode::IOERR);
            }
        };
        if !parsed_truth.defects().is_empty() {
            warn!(
                "Truth VCF has {} quarantined records; they are excluded from the truth set.",
                parsed_truth.defects().len()
            );
        }
        let truth_sample_index = match resolve_sample_index(parsed_truth.header(), &settings.truth_sample, "truth") {
            Ok(si) => si,
            Err(e) => {
                error!("Error while resolving truth sample: {e:#}");
                std::process::exit(exitcode::CONFIG);
            }
        };
        truth_from_vcf(&parsed_truth, truth_sample_index)
    } else {
        // reference-pair mode; check_verify_settings guarantees both files are set
        info!("Loading reference pair...");
        let original = match load_fasta(settings.original_reference_filename.as_deref().unwrap()) {
            Ok(seqs) => seqs,
            Err(e) => {
                error!("Error while loading original reference: {e:#}");
                std::process::exit(exitcode::IOERR);
            }
        };
        let mutated = match load_fasta(settings.mutated_reference_filename.as_deref().unwrap()) {
            Ok(seqs) => seqs,
            Err(e) => {
                error!("Error while loading mutated reference: {e:#}");
                std::process::exit(exitcode::IOERR);
            }
        };
        info!("Deriving truth variants from the reference pair...");
        match truth_from_reference_files(&original, &mutated) {
            Ok(tv) => tv,
            Err(e) => {
                error!("Error while deriving truth variants: {e:#}");
                std::process::exit(exitcode::DATAERR);
            }
        }
    };
    info!("Truth set contains {} variants.", truth_variants.len());

    let called_record_count = parsed_calls.records().len() as u64;
    let called_variant_count = called_variants.len() as u64;
    let truth_variant_count = truth_variants.len() as u64;

    // group both sides by contig; contigs are independent units of work
    let mut contig_batches: BTreeMap<String, (Vec<NormalizedVariant>, Vec<TruthVariant>)> = BTreeMap::new();
    for variant in called_variants.into_iter() {
        contig_batches.entry(variant.contig().to_string()).or_default().0.push(variant);
    }
    for truth in truth_variants.into_iter() {
        contig_batches.entry(truth.variant().contig().to_string()).or_default().1.push(truth);
    }

    // build the match configuration
    let match_config = match MatchConfigBuilder::default()
        .position_tolerance(settings.position_tolerance)
        .genotype_aware(settings.genotype_aware)
        .build() {
        Ok(mc) => mc,
        Err(e) => {
            error!("Error while building match config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // run the parallel iterator to match each contig batch
    let style = get_progress_style();
    info!("Matching variants in {} contig batches...", contig_batches.len());
    let batches: Vec<(String, Vec<NormalizedVariant>, Vec<TruthVariant>)> = contig_batches.into_iter()
        .map(|(contig, (called, truth))| (contig, called, truth))
        .collect();
    let mut all_results: Vec<(String, Option<Vec<MatchOutcome>>)> = batches.into_par_iter()
        .map(|(contig, called, truth)| {
            debug!("contig = {contig}: {} called, {} truth", called.len(), truth.len());
            let outcomes = match match_variants(&called, &truth, match_config) {
                Ok(o) => Some(o),
                Err(e) => {
                    error!("Error while matching contig {contig}: {e:#}");
                    None
                }
            };
            (contig, outcomes)
        })
        .progress_with_style(style)
        .collect();

    // sort by contig name so the single-threaded fold below is deterministic
    all_results.sort_by(|(c1, _o1), (c2, _o2)| c1.cmp(c2));
    info!("Contig matching complete, saving all outputs...");

    // fold everything into the summary accumulator
    let mut summary_writer = SummaryWriter::new(settings.verify_label.clone());
    summary_writer.add_defects(parsed_calls.defects());
    let mut all_outcomes: Vec<MatchOutcome> = vec![];
    for (_contig, opt_outcomes) in all_results.into_iter() {
        match opt_outcomes {
            Some(outcomes) => {
                summary_writer.add_outcomes(&outcomes);
                all_outcomes.extend(outcomes);
            },
            None => summary_writer.add_contig_error()
        };
    }

    let overall = summary_writer.metrics().overall();
    info!("Joint metrics: {overall:?}");
    info!("\tRecall: {:?}", overall.recall());
    info!("\tPrecision: {:?}", overall.precision());
    info!("\tF1: {:?}", overall.f1());
    info!("Solved:error contigs: {} : {}", summary_writer.solved_contigs(), summary_writer.error_contigs());

    // now write things
    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving output summary to {summary_fn:?}...");
    if let Err(e) = summary_writer.write_summary(&summary_fn) {
        error!("Error while saving summary file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let outcomes_fn = settings.output_folder.join("variant_outcomes.tsv");
    info!("Saving per-variant outcomes to {outcomes_fn:?}...");
    if let Err(e) = write_variant_outcomes(&all_outcomes, &outcomes_fn) {
        error!("Error while saving outcome file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let defects_fn = settings.output_folder.join("parse_defects.tsv");
    info!("Saving parse defects to {defects_fn:?}...");
    if let Err(e) = write_parse_defects(parsed_calls.defects(), &defects_fn) {
        error!("Error while saving defect file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let report = summary_writer.build_run_report(called_record_count, called_variant_count, truth_variant_count);
    let report_fn = settings.output_folder.join("run_report.json");
    info!("Saving run report to {report_fn:?}...");
    if let Err(e) = save_json(&report, &report_fn) {
        error!("Error while saving run report: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!(
        "Verification completed in {} seconds with {} malformed record(s) skipped.",
        start_time.elapsed().as_secs_f64(), report.malformed_records
    );
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Verify(settings) => {
            run_verify(*settings);
        }
    }

    info!("Process finished successfully.");
}
