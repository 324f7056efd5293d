use anyhow::{Context, Result};
use clap::Parser;
use interim_power::cli::{Cli, OutputFormat};
use interim_power::power::{ExperimentPowerRequest, PowerConfig};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_request(args: &Cli) -> Result<ExperimentPowerRequest> {
    let contents = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read request {}", args.input.display()))?;
    let mut request: ExperimentPowerRequest = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse request {}", args.input.display()))?;

    if let Some(days) = args.days_remaining {
        request.target_days_remaining = days;
    }
    Ok(request)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => PowerConfig::from_file(path)?,
        None => PowerConfig::default(),
    };
    let request = load_request(&args)?;
    let today = args
        .today
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let Some(result) = request.analyze(today, &config) else {
        anyhow::bail!("power estimate unavailable: results were incomplete or not finite");
    };

    match args.format {
        OutputFormat::Text => print!("{}", result.to_report_string()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}
