
/// Helper functions for writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
/// Functions for basic sequence alignment scoring and traceback
pub mod sequence_alignment;
