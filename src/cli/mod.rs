/*!
# CLI module
Command line interface functionality that is specific to Varify.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The verify CLI subcommand
pub mod verify;
