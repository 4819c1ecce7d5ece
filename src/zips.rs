use rust_decimal::Decimal;
use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    io::Read,
    path::Path,
};
use tracing::{debug, info, instrument};

use crate::{
    error::{Result, SlcspError},
    money::to_cents,
    plans::{RateArea, SilverPlans},
    table::{self, Table},
};

/// A Silver rate a target ZIP could be priced at, rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateRate {
    pub state: String,
    pub rate_area: String,
    pub zip: String,
    pub rate: Decimal,
}

const ZIP_COLUMNS: &[&str] = &["zipcode", "state", "rate_area"];

#[derive(Debug, Deserialize)]
struct ZipRow {
    zipcode: String,
    state: String,
    rate_area: String,
}

/// Result of joining the ZIP mapping against targets and Silver plans.
#[derive(Debug, Default)]
pub struct ZipAreaJoin {
    /// Unique (zip, state, rate_area, rate) tuples, in discovery order.
    /// Diagnostic only: resolution reads `areas` and the exact plan rates,
    /// never these rounded values.
    pub candidates: Vec<CandidateRate>,
    /// Every rate area each target ZIP maps to, whether or not it has Silver plans.
    areas: HashMap<String, BTreeSet<RateArea>>,
}

impl ZipAreaJoin {
    pub fn areas_for(&self, zip: &str) -> Option<&BTreeSet<RateArea>> {
        self.areas.get(zip)
    }

    /// Target ZIPs that appeared at least once in the mapping table.
    pub fn mapped_zip_count(&self) -> usize {
        self.areas.len()
    }
}

/// Accumulates candidates across mapping rows; dedup is global to the run.
struct Joiner<'a> {
    targets: &'a HashSet<&'a str>,
    plans: &'a SilverPlans,
    seen: HashSet<(String, RateArea, Decimal)>,
    out: ZipAreaJoin,
}

impl<'a> Joiner<'a> {
    fn new(targets: &'a HashSet<&'a str>, plans: &'a SilverPlans) -> Self {
        Self {
            targets,
            plans,
            seen: HashSet::new(),
            out: ZipAreaJoin::default(),
        }
    }

    fn push(&mut self, row: ZipRow) {
        if !self.targets.contains(row.zipcode.as_str()) {
            return;
        }
        let area = RateArea::new(row.state, row.rate_area);

        for &exact in self.plans.rates(&area) {
            let rate = to_cents(exact);
            let key = (row.zipcode.clone(), area.clone(), rate);
            if self.seen.insert(key) {
                self.out.candidates.push(CandidateRate {
                    state: area.state.clone(),
                    rate_area: area.rate_area.clone(),
                    zip: row.zipcode.clone(),
                    rate,
                });
            }
        }

        self.out.areas.entry(row.zipcode).or_default().insert(area);
    }

    fn finish(self) -> ZipAreaJoin {
        self.out
    }
}

/// Read the ZIP to rate-area mapping and join it with the targets and plans.
/// Both loaders must have finished before this runs.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn join_zip_areas(
    path: &Path,
    delimiter: u8,
    targets: &HashSet<&str>,
    plans: &SilverPlans,
) -> Result<ZipAreaJoin> {
    let rdr = table::open(Table::Zips, path, delimiter)?;
    let joined = collect_join(rdr, targets, plans)?;
    info!(
        candidates = joined.candidates.len(),
        mapped = joined.mapped_zip_count(),
        "joined zip areas"
    );
    Ok(joined)
}

pub fn read_zip_areas<R: Read>(
    reader: R,
    delimiter: u8,
    targets: &HashSet<&str>,
    plans: &SilverPlans,
) -> Result<ZipAreaJoin> {
    collect_join(table::from_reader(reader, delimiter), targets, plans)
}

fn collect_join<R: Read>(
    mut rdr: csv::Reader<R>,
    targets: &HashSet<&str>,
    plans: &SilverPlans,
) -> Result<ZipAreaJoin> {
    let headers = table::headers(Table::Zips, &mut rdr)?;
    table::require_columns(Table::Zips, &headers, ZIP_COLUMNS)?;
    let mut joiner = Joiner::new(targets, plans);

    for result in rdr.records() {
        let record = result.map_err(|e| SlcspError::parse(Table::Zips, e))?;
        let row: ZipRow = record
            .deserialize(Some(&headers))
            .map_err(|e| SlcspError::parse(Table::Zips, e))?;
        joiner.push(row);
    }

    let joined = joiner.finish();
    debug!(candidates = ?joined.candidates, "candidate rates");
    Ok(joined)
}
