//! Grid constants and runtime configuration defaults

// Sentinel and sampling defaults
/// Null sentinel used when a grid is created without an explicit one
pub const DEFAULT_NULL_VALUE: f32 = -999.25;

/// Distance (in cells) beyond the outer nodes that XY queries still snap onto the edge
pub const DEFAULT_BOUNDS_TOLERANCE: f64 = 0.5;

// Bilinear samples with less valid weight than this resolve to null
/// Minimum accumulated neighbour weight for a bilinear sample
pub const MIN_INTERPOLATION_WEIGHT: f64 = 0.5;

// Geometry solver settings
/// Tolerance for treating geometry terms as zero
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Tolerance used when classifying corner points as rectilinear or rectangular
pub const SHAPE_TOLERANCE: f64 = 1e-4;

/// Maximum Newton iterations for the inverse bilinear fallback
pub const NEWTON_MAX_ITERATIONS: usize = 32;

/// Parameter-space convergence threshold for Newton iteration
pub const NEWTON_TOLERANCE: f64 = 1e-12;

// Binary grid layout
/// Number of 32-bit words in the binary grid header
pub const HEADER_WORDS: usize = 6;

/// Size of the binary grid header in bytes
pub const HEADER_BYTES: usize = HEADER_WORDS * 4;

/// Magic word identifying a binary grid ("GRD1")
pub const GRID_MAGIC: u32 = 0x4752_4431;

/// Size of one stored sample in bytes
pub const SAMPLE_BYTES: usize = 4;

/// Largest cell count a grid may hold; bigger sample blocks cannot be addressed
pub const MAX_CELL_COUNT: usize = isize::MAX as usize / SAMPLE_BYTES;

/// Offset returned by the binary writer when output fails
pub const WRITE_FAILED_OFFSET: i64 = -1;

// ASCII ModSpec layout
/// Values written per line in the ASCII grid body
pub const ASCII_VALUES_PER_LINE: usize = 8;

// Legacy binary ModSpec layout
/// First line of a binary `ModSpec` grid
pub const MODSPEC_MARKER: &str = "#<CPS_v1 TYPE=MODSPEC_GRID/>";

/// Line closing the key=value section of a binary `ModSpec` header
pub const MODSPEC_HEADER_END: &str = "#</MODSPEC_GRID>";

/// Line introducing the binary section of a `ModSpec` grid
pub const MODSPEC_DATA_TAG: &str = "#<DTA_MODSPEC_GRID>";

/// Width that fixed `ModSpec` header entries are padded to, before the newline
pub const MODSPEC_ENTRY_WIDTH: usize = 70;

/// Longest `ModSpec` header line the reader accepts
pub const MODSPEC_MAX_LINE_BYTES: usize = 4096;

// File naming
/// Extension of binary grid files
pub const BINARY_GRID_EXTENSION: &str = "grid";

/// Extensions recognised as ASCII ModSpec grids
pub const ASCII_GRID_EXTENSIONS: [&str; 2] = ["asc", "dat"];

/// Extension of legacy binary `ModSpec` grid files
pub const MODSPEC_GRID_EXTENSION: &str = "cps";

/// Suffix added to output filenames when no output path is given
pub const OUTPUT_SUFFIX: &str = "_edit";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "warn";
