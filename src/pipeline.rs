use std::{fmt, path::PathBuf};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, instrument};

use crate::{
    error::{Result, SlcspError},
    output::{write_output, Destination},
    plans::{load_silver_plans, SilverPlans},
    resolve::{resolve, ResolvedTarget},
    table::Table,
    targets::{load_targets, TargetTable},
    zips::join_zip_areas,
};

/// Input and output locations for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub plans: PathBuf,
    pub zips: PathBuf,
    pub targets: PathBuf,
    pub output: Destination,
    pub delimiter: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plans: PathBuf::from("plans.csv"),
            zips: PathBuf::from("zips.csv"),
            targets: PathBuf::from("slcsp.csv"),
            output: Destination::Stdout,
            delimiter: b',',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub resolved: usize,
    pub blank: usize,
    pub candidates: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} targets, {} resolved, {} blank ({} candidate rates)",
            self.targets, self.resolved, self.blank, self.candidates
        )
    }
}

/// Everything a run computes, before it is written out.
#[derive(Debug)]
pub struct Resolution {
    pub table: TargetTable,
    pub resolved: Vec<ResolvedTarget>,
    pub summary: RunSummary,
}

/// Load plans and targets side by side, then join and resolve.
#[instrument(level = "info", skip_all)]
pub async fn compute(config: &PipelineConfig) -> Result<Resolution> {
    let delimiter = config.delimiter;

    let plans_path = config.plans.clone();
    let plans_task = task::spawn_blocking(move || load_silver_plans(&plans_path, delimiter));
    let targets_path = config.targets.clone();
    let targets_task = task::spawn_blocking(move || load_targets(&targets_path, delimiter));

    // both loaders must be done before the mapping table is read
    let (plans, table) = tokio::try_join!(
        finished(Table::Plans, plans_task),
        finished(Table::Targets, targets_task)
    )?;

    let plans = SilverPlans::from_records(plans);
    debug!(
        plans = plans.plan_count(),
        areas = plans.area_count(),
        "indexed silver plans"
    );

    let joined = join_zip_areas(&config.zips, delimiter, &table.zip_set(), &plans)?;
    let resolved = resolve(&table.targets(), &joined, &plans);

    let resolved_count = resolved.iter().filter(|r| r.rate.is_some()).count();
    let summary = RunSummary {
        targets: resolved.len(),
        resolved: resolved_count,
        blank: resolved.len() - resolved_count,
        candidates: joined.candidates.len(),
    };

    Ok(Resolution {
        table,
        resolved,
        summary,
    })
}

async fn finished<T>(table: Table, handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|source| SlcspError::Task { table, source })?
}

/// Run the whole pipeline. Nothing is written unless every load succeeds.
pub async fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let Resolution {
        table,
        resolved,
        summary,
    } = compute(config).await?;

    write_output(&table, &resolved, config.delimiter, &config.output)?;
    info!(%summary, "run complete");
    Ok(summary)
}
