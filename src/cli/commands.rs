use clap::{Args, Parser, Subcommand};

use crate::models::ToolName;

#[derive(Parser)]
#[command(name = "scanwatch", version, about = "Live scan telemetry for the AI red-team dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Dashboard base URL (overrides SCANWATCH_SERVER and the config file)
    #[arg(short, long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow a running scan until every tool settles
    Watch(WatchArgs),
    /// Start a scan on the dashboard, optionally following it
    Start(StartArgs),
    /// Print the results the dashboard holds for a scan
    Results(ResultsArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct WatchArgs {
    /// Project the scan belongs to
    #[arg(short, long)]
    pub project: Option<String>,

    /// Scan identifier returned when the scan was started
    #[arg(long)]
    pub scan_id: Option<String>,

    /// Comma-separated tools the scan runs (name or slug)
    #[arg(short, long, value_delimiter = ',')]
    pub tools: Vec<ToolName>,

    /// Directory to write the final JSON and markdown report to
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the final session view as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct StartArgs {
    /// Project to scan
    #[arg(short, long)]
    pub project: String,

    /// Comma-separated tools to run (name or slug)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub tools: Vec<ToolName>,

    /// Follow the scan after starting it
    #[arg(short, long)]
    pub watch: bool,

    /// Directory to write the final report to (with --watch)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Clone)]
pub struct ResultsArgs {
    /// Project the scan belongs to
    #[arg(short, long)]
    pub project: String,

    /// Only show results of this scan
    #[arg(long)]
    pub scan_id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_with_tool_list() {
        let cli = Cli::try_parse_from([
            "scanwatch", "-vv", "watch", "--project", "p1", "--scan-id", "s1", "--tools", "PromptMap,rag-tester",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.project.as_deref(), Some("p1"));
                assert_eq!(args.tools, vec![ToolName::PromptMap, ToolName::RagTester]);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_start_requires_tools() {
        assert!(Cli::try_parse_from(["scanwatch", "start", "--project", "p1"]).is_err());
    }

    #[test]
    fn test_unknown_tool_rejected() {
        assert!(Cli::try_parse_from(["scanwatch", "watch", "--tools", "nmap"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["scanwatch", "results", "--project", "p1", "--json-logs", "--no-color"]).unwrap();
        assert!(cli.json_logs);
        assert!(cli.no_color);
    }
}
