use super::commands::ResultsArgs;
use super::context::CliContext;
use crate::api::DashboardClient;
use crate::errors::ScanwatchError;
use crate::metrics::recompute;
use crate::models::ScanResult;

pub async fn handle_results(args: ResultsArgs, ctx: &CliContext) -> Result<(), ScanwatchError> {
    let client = DashboardClient::new(&ctx.server);
    let results: Vec<ScanResult> = client
        .project_results(&args.project)
        .await?
        .into_iter()
        .filter(|r| args.scan_id.as_deref().map_or(true, |scan| r.belongs_to_scan(scan)))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for project {}", args.project);
        return Ok(());
    }

    for result in &results {
        let severity = result.severity.map(|s| s.as_str()).unwrap_or("-");
        let rate = result
            .metrics
            .map(|m| format!("{:.1}%", m.attack_success_rate))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<28} {:<14} {:<10} {:<9} {:>7}  {}",
            result.id,
            result.tool_name.as_str(),
            result.status.as_str(),
            severity,
            rate,
            result.timestamp.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    let aggregated = recompute(&results);
    println!(
        "\n{} results | {} critical | avg success {:.1}% | avg detection {:.2}s | exfil {:.2} MB",
        aggregated.total_scans,
        aggregated.critical_findings,
        aggregated.average_success_rate,
        aggregated.average_detection_time,
        aggregated.total_data_exfil,
    );
    Ok(())
}
