/*!
# Writers module
Contains the logic for writing the output files for the verify command.
*/
/// Generates the per-variant outcome and parse-defect tables
pub mod outcome_writer;
/// Generates the summary stats file and the end-of-run report
pub mod summary;
