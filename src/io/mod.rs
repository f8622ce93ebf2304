/// ASCII `ModSpec` grid reader and writer
pub mod ascii;
/// Area-of-interest polygon text files
pub mod aoi_file;
/// Command-line interface and file dispatch
pub mod cli;
/// Binary grid header and sample codec
pub mod codec;
/// Constants and defaults
pub mod configuration;
/// Error types
pub mod error;
/// Legacy binary `ModSpec` grid reader and writer
pub mod modspec;
/// Progress reporting and cancellation
pub mod progress;
/// Horizontal distance units
pub mod units;
