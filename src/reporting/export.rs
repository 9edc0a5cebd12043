use std::path::{Path, PathBuf};

use tracing::info;

use super::formatter::format_session_report;
use crate::errors::ScanwatchError;
use crate::session::SessionView;

/// Paths written by [`export_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// Write `{scan_id}.json` and `{scan_id}.md` into `dir`.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// reader never observes a partial report.
pub async fn export_session(view: &SessionView, dir: &Path) -> Result<ExportedReport, ScanwatchError> {
    tokio::fs::create_dir_all(dir).await?;

    let stem = sanitize(&view.scan_id);
    let json = dir.join(format!("{}.json", stem));
    let markdown = dir.join(format!("{}.md", stem));

    write_atomic(&json, serde_json::to_string_pretty(view)?.as_bytes()).await?;
    write_atomic(&markdown, format_session_report(view).as_bytes()).await?;

    info!(
        scan_id = %view.scan_id,
        json = %json.display(),
        markdown = %markdown.display(),
        results = view.results.len(),
        "Session report exported"
    );
    Ok(ExportedReport { json, markdown })
}

/// Read back a JSON export.
pub async fn load_session(path: &Path) -> Result<SessionView, ScanwatchError> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ScanwatchError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn sanitize(scan_id: &str) -> String {
    let cleaned: String = scan_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "scan".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_scan_id() {
        assert_eq!(sanitize("scan-1_a"), "scan-1_a");
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize(""), "scan");
    }
}
