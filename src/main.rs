use anyhow::{bail, Context, Result};
use clap::Parser;
use slcsp::{output::Destination, PipelineConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Fill in the second lowest cost Silver plan rate for each target ZIP.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Plans table (state, rate_area, rate, metal_level, ...)
    #[arg(long, default_value = "plans.csv")]
    plans: PathBuf,

    /// ZIP to rate-area mapping (zipcode, state, rate_area, ...)
    #[arg(long, default_value = "zips.csv")]
    zips: PathBuf,

    /// Target ZIPs (zipcode, rate)
    #[arg(long, default_value = "slcsp.csv")]
    targets: PathBuf,

    /// Write the completed table here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Field delimiter shared by all tables
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        Ok(PipelineConfig {
            plans: self.plans,
            zips: self.zips,
            targets: self.targets,
            output: self
                .output
                .map(Destination::File)
                .unwrap_or(Destination::Stdout),
            delimiter: self.delimiter as u8,
        })
    }
}

#[tokio::main]
async fn main() {
    // logs go to stderr; stdout carries the table
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = try_main().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let config = Args::parse().into_config()?;
    info!(
        plans = %config.plans.display(),
        zips = %config.zips.display(),
        targets = %config.targets.display(),
        output = %config.output,
        "startup"
    );

    let summary = slcsp::run(&config)
        .await
        .context("slcsp run failed")?;
    info!(blank = summary.blank, "all done");
    Ok(())
}
