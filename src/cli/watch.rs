use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::commands::WatchArgs;
use super::context::CliContext;
use super::progress::ScanProgress;
use crate::api::DashboardClient;
use crate::errors::ScanwatchError;
use crate::poll::HttpResultsFetcher;
use crate::reporting::{export_session, format_executive_summary};
use crate::session::{ScanSession, SessionRequest, SessionView, StartDecision, ValidatedRequest};
use crate::stream::WsConnector;

pub async fn handle_watch(args: WatchArgs, ctx: &CliContext) -> Result<(), ScanwatchError> {
    let request = SessionRequest {
        project_id: args.project.clone(),
        scan_id: args.scan_id.clone(),
        tools: args.tools.clone(),
    };

    match request.validate() {
        StartDecision::Start(validated) => {
            follow_scan(validated, ctx, args.output.as_deref(), args.json).await
        }
        StartDecision::RedirectToProjectSelection { reason } => Err(redirect_error(&reason)),
    }
}

/// Missing session inputs surface as a configuration error pointing back at project selection.
pub fn redirect_error(reason: &str) -> ScanwatchError {
    ScanwatchError::Config(format!(
        "Cannot follow scan: {}. Select a project and start a scan first \
         (scanwatch start --project <id> --tools <tools> --watch)",
        reason
    ))
}

/// Run a monitoring session to completion (or Ctrl-C), rendering progress as it goes.
pub async fn follow_scan(
    request: ValidatedRequest,
    ctx: &CliContext,
    output: Option<&str>,
    json: bool,
) -> Result<(), ScanwatchError> {
    let client = DashboardClient::new(&ctx.server);

    match client.get_project(request.project_id()).await {
        Ok(project) => info!(
            project_id = %project.id,
            name = %project.name,
            target = %project.target_url,
            "Watching scan"
        ),
        Err(e @ ScanwatchError::NotFound(_)) => return Err(e),
        Err(e) => warn!(project_id = %request.project_id(), error = %e, "Project lookup failed; continuing"),
    }

    let connector = Arc::new(WsConnector::from_http_base(&ctx.server)?);
    let fetcher = Arc::new(HttpResultsFetcher::new(client, request.project_id(), request.scan_id()));
    let session = ScanSession::new(request.clone(), ctx.config.to_settings(), connector, fetcher);

    let handle = session.spawn();
    let mut views = handle.subscribe();
    let mut progress = (!json).then(|| ScanProgress::new(request.tools()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!(scan_id = %request.scan_id(), "Interrupted; closing session");
                handle.close();
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if let Some(progress) = progress.as_mut() {
                    progress.update(&view);
                }
                if view.is_complete {
                    break;
                }
            }
        }
    }

    let final_view = handle.wait().await?;
    if let Some(progress) = progress.as_mut() {
        progress.finish(&final_view);
    }

    let output_dir = output.or(ctx.config.output_directory());
    if let Some(dir) = output_dir {
        let exported = export_session(&final_view, &PathBuf::from(dir)).await?;
        if !json {
            println!("Report written to {}", exported.markdown.display());
        }
    }

    print_final(&final_view, json)
}

fn print_final(view: &SessionView, json: bool) -> Result<(), ScanwatchError> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    println!();
    println!("{}", format_executive_summary(view));
    if !view.is_complete {
        println!("Session ended before every tool settled ({:.0}% progress).", view.progress_percent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_error_exit_code() {
        let err = redirect_error("no project selected");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("no project selected"));
    }
}
