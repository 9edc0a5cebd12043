use tracing::info;

use super::commands::StartArgs;
use super::context::CliContext;
use super::watch::{follow_scan, redirect_error};
use crate::api::DashboardClient;
use crate::errors::ScanwatchError;
use crate::session::{SessionRequest, StartDecision};

pub async fn handle_start(args: StartArgs, ctx: &CliContext) -> Result<(), ScanwatchError> {
    let client = DashboardClient::new(&ctx.server);
    let project = client.get_project(&args.project).await?;
    info!(project_id = %project.id, name = %project.name, tools = args.tools.len(), "Starting scan");

    let started = client.start_scan(&project.id, &args.tools).await?;
    println!("Scan {} {} for project {}", started.scan_id, started.status, project.name);

    if !args.watch {
        return Ok(());
    }

    let request = SessionRequest {
        project_id: Some(project.id),
        scan_id: Some(started.scan_id),
        tools: args.tools,
    };
    match request.validate() {
        StartDecision::Start(validated) => follow_scan(validated, ctx, args.output.as_deref(), false).await,
        StartDecision::RedirectToProjectSelection { reason } => Err(redirect_error(&reason)),
    }
}
