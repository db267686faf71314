use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use monte_carlo_pi::trigger::StdinTrigger;
use monte_carlo_pi::{Coordinator, Reporter, SamplerConfig};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the narration and the CSV stream.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut coordinator = Coordinator::new(SamplerConfig::default());
    let mut reporter = Reporter::stdout();

    let summary = coordinator
        .run(&mut StdinTrigger, &mut reporter)
        .context("sampling run failed")?;
    reporter
        .summary(&summary)
        .context("failed to write the report")?;

    Ok(())
}
