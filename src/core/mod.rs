/*!
# Core Module

Error type, source positions and file reading shared by every stage.
*/

pub mod errors;
pub mod fs_utils;
pub mod position;

pub use errors::{ScanError, ScanResult};
pub use fs_utils::{check_size, read_dxl_file, DEFAULT_MAX_FILE_SIZE};
pub use position::{LineIndex, Position};
