use rust_decimal::Decimal;
use serde::Deserialize;
use std::{collections::HashMap, io::Read, path::Path};
use tracing::{debug, info, instrument};

use crate::{
    error::{Result, SlcspError},
    money::parse_rate,
    table::{self, Table},
};

pub const SILVER: &str = "Silver";

/// A state-specific pricing region, e.g. `("MO", "3")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateArea {
    pub state: String,
    pub rate_area: String,
}

impl RateArea {
    pub fn new(state: impl Into<String>, rate_area: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            rate_area: rate_area.into(),
        }
    }
}

/// One Silver plan's price in one rate area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    pub state: String,
    pub rate_area: String,
    pub rate: Decimal,
}

const PLAN_COLUMNS: &[&str] = &["state", "rate_area", "rate", "metal_level"];

#[derive(Debug, Deserialize)]
struct PlanRow {
    state: String,
    rate_area: String,
    rate: String,
    metal_level: String,
}

#[instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn load_silver_plans(path: &Path, delimiter: u8) -> Result<Vec<PlanRecord>> {
    let rdr = table::open(Table::Plans, path, delimiter)?;
    let plans = collect_silver(rdr)?;
    info!(silver = plans.len(), "loaded plans");
    Ok(plans)
}

/// Same as [`load_silver_plans`] but over any byte source.
pub fn read_silver_plans<R: Read>(reader: R, delimiter: u8) -> Result<Vec<PlanRecord>> {
    collect_silver(table::from_reader(reader, delimiter))
}

fn collect_silver<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<PlanRecord>> {
    let headers = table::headers(Table::Plans, &mut rdr)?;
    table::require_columns(Table::Plans, &headers, PLAN_COLUMNS)?;
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = result.map_err(|e| SlcspError::parse(Table::Plans, e))?;
        let row: PlanRow = record
            .deserialize(Some(&headers))
            .map_err(|e| SlcspError::parse(Table::Plans, e))?;

        if row.metal_level != SILVER {
            skipped += 1;
            continue;
        }
        let rate = parse_rate(&row.rate).map_err(|source| SlcspError::InvalidRate {
            table: Table::Plans,
            line: table::line_of(&record),
            value: row.rate.clone(),
            source,
        })?;
        out.push(PlanRecord {
            state: row.state,
            rate_area: row.rate_area,
            rate,
        });
    }

    debug!(kept = out.len(), skipped, "filtered plans to {}", SILVER);
    Ok(out)
}

/// Silver rates grouped by rate area.
#[derive(Debug, Default)]
pub struct SilverPlans {
    by_area: HashMap<RateArea, Vec<Decimal>>,
    plan_count: usize,
}

impl SilverPlans {
    pub fn from_records(records: Vec<PlanRecord>) -> Self {
        let plan_count = records.len();
        let mut by_area: HashMap<RateArea, Vec<Decimal>> = HashMap::new();
        for plan in records {
            by_area
                .entry(RateArea::new(plan.state, plan.rate_area))
                .or_default()
                .push(plan.rate);
        }
        Self {
            by_area,
            plan_count,
        }
    }

    /// Every Silver rate offered in `area`, duplicates included.
    pub fn rates(&self, area: &RateArea) -> &[Decimal] {
        self.by_area.get(area).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn plan_count(&self) -> usize {
        self.plan_count
    }

    pub fn area_count(&self) -> usize {
        self.by_area.len()
    }
}
