use clap::Parser;
use lpguard::{run_demo, DemoConfig};
use miette::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lpguard")]
#[command(author, version, about = "Recover from LP library errors instead of aborting")]
struct Cli {
    /// Configuration file (lpguard.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of iterations; odd iterations force a library error
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Exit with status 1 if any iteration did not succeed
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    // Logs go to stderr; stdout carries the program transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => DemoConfig::from_file(path)?,
        None => DemoConfig::default(),
    };
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    config.strict |= cli.strict;
    config.validate()?;
    config.apply();

    let report = run_demo(&config);
    tracing::debug!(
        failures = report.failures(),
        total = report.iterations.len(),
        "demo finished"
    );

    let code = report.exit_code(config.strict);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
