pub mod scan_result;
pub mod severity;
pub mod timestamp;
pub mod tool;

pub use scan_result::*;
pub use severity::*;
pub use tool::*;
