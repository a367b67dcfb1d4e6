//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - lint found issues in the meta info or values
pub const VALIDATION_ERROR: i32 = 2;

/// Conversion error - values could not be built from parameters
pub const CONVERSION_ERROR: i32 = 3;

/// Meta info error - the meta info file failed to load
pub const METAINFO_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
