use csv::StringRecord;
use std::{collections::HashSet, io::Read, path::Path};
use tracing::{info, instrument, warn};

use crate::{
    error::{Result, SlcspError},
    table::{self, Table},
};

pub const ZIPCODE_COLUMN: &str = "zipcode";
pub const RATE_COLUMN: &str = "rate";

/// A ZIP the caller wants an SLCSP answer for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetZip {
    pub zipcode: String,
}

/// The targets file as read: header, rows in input order, and where the
/// zipcode and rate columns sit. The rows are written back out unchanged
/// apart from the rate column.
#[derive(Debug, Clone)]
pub struct TargetTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
    zip_column: usize,
    rate_column: usize,
}

impl TargetTable {
    pub fn rate_column(&self) -> usize {
        self.rate_column
    }

    /// Targets in file order.
    pub fn targets(&self) -> Vec<TargetZip> {
        self.zipcodes()
            .map(|z| TargetZip {
                zipcode: z.to_string(),
            })
            .collect()
    }

    pub fn zipcodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| &r[self.zip_column])
    }

    /// Set view used to filter the mapping table.
    pub fn zip_set(&self) -> HashSet<&str> {
        self.zipcodes().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn load_targets(path: &Path, delimiter: u8) -> Result<TargetTable> {
    let rdr = table::open(Table::Targets, path, delimiter)?;
    let targets = collect_targets(rdr)?;
    info!(targets = targets.len(), "loaded targets");
    Ok(targets)
}

pub fn read_targets<R: Read>(reader: R, delimiter: u8) -> Result<TargetTable> {
    collect_targets(table::from_reader(reader, delimiter))
}

fn collect_targets<R: Read>(mut rdr: csv::Reader<R>) -> Result<TargetTable> {
    let headers = table::headers(Table::Targets, &mut rdr)?;
    let zip_column = table::column_index(Table::Targets, &headers, ZIPCODE_COLUMN)?;
    let rate_column = table::column_index(Table::Targets, &headers, RATE_COLUMN)?;

    let rows = rdr
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SlcspError::parse(Table::Targets, e))?;

    let targets = TargetTable {
        headers,
        rows,
        zip_column,
        rate_column,
    };
    let unique = targets.zip_set().len();
    if unique != targets.len() {
        warn!(
            rows = targets.len(),
            unique, "targets file lists some ZIPs more than once"
        );
    }
    Ok(targets)
}
