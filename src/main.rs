use clap::Parser;
use scanwatch::cli::{self, CliContext, Commands};
use scanwatch::config;
use scanwatch::errors::ScanwatchError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }
    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: cli::Cli) -> Result<(), ScanwatchError> {
    if let Commands::Validate(args) = &cli.command {
        return handle_validate(&args.config).await;
    }

    let ctx = CliContext::load(cli.config.as_deref(), cli.server.as_deref()).await?;
    match cli.command {
        Commands::Watch(args) => cli::watch::handle_watch(args, &ctx).await,
        Commands::Start(args) => cli::start::handle_start(args, &ctx).await,
        Commands::Results(args) => cli::results::handle_results(args, &ctx).await,
        Commands::Validate(_) => Ok(()),
    }
}

async fn handle_validate(path: &str) -> Result<(), ScanwatchError> {
    let parsed = config::parse_config(&std::path::PathBuf::from(path)).await?;
    let settings = parsed.to_settings();
    println!("Configuration is valid: {}", path);
    println!(
        "  reconnect: {} attempts, {}ms base | poll: {}ms (max {}ms), degraded after {} failures",
        settings.reconnect.max_attempts,
        settings.reconnect.base_delay.as_millis(),
        settings.poll.interval.as_millis(),
        settings.poll.max_interval.as_millis(),
        settings.poll.degraded_after,
    );
    Ok(())
}
