//! Shared application-wide constants.
//! Centralizes the numeric domains and defaults used by the codec and the store.

// Shape domains
/// Smallest size any shape kind accepts.
pub const MIN_SIZE: u32 = 2;
/// Largest side length of a rectilinear maze.
pub const MAX_RECTILINEAR_SIZE: u32 = 100;
/// Largest ring count of a theta (circular) maze.
pub const MAX_THETA_RINGS: u32 = 50;
/// Largest ring count of a sigma (hexagonal) maze.
pub const MAX_SIGMA_RINGS: u32 = 100;
/// Factor applied when converting a theta ring count to and from other kinds.
pub const THETA_SCALE: i64 = 2;

// Defaults
/// Side length of the default rectilinear maze.
pub const DEFAULT_MAZE_SIZE: u32 = 10;
/// Default wall colour, six hex digits without a leading `#`.
pub const DEFAULT_COLOUR: &str = "EEEEEE";
/// Default stroke width for maze walls.
pub const DEFAULT_STROKE_WIDTH: f64 = 8.0;

// Fragment encoding
/// Separator between positional fragment tokens.
pub const FRAGMENT_SEPARATOR: char = '|';
/// Number of positional tokens in the canonical fragment.
pub const FRAGMENT_TOKENS: usize = 3;

// Export
/// Upper bound on the number of pages a single export may plan.
pub const MAX_EXPORT_PAGES: u32 = 100;
/// Scale applied when rasterising an exported page to PNG.
pub const PNG_EXPORT_SCALE: f32 = 1.0;
