pub mod export;
pub mod formatter;

pub use export::{export_session, load_session, ExportedReport};
pub use formatter::{format_executive_summary, format_session_report};
