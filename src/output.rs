use csv::WriterBuilder;
use std::{
    fmt, fs,
    io::{self, Write},
    path::PathBuf,
};
use tracing::info;

use crate::{
    error::{Result, SlcspError},
    money::format_rate,
    resolve::ResolvedTarget,
    targets::TargetTable,
};

/// Where the completed table goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("stdout"),
            Destination::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Render the targets table with the rate column replaced by `resolved`.
/// `resolved` must be in the same order as `table.rows`.
pub fn render(
    table: &TargetTable,
    resolved: &[ResolvedTarget],
    delimiter: u8,
) -> io::Result<Vec<u8>> {
    debug_assert_eq!(table.len(), resolved.len());
    let rate_column = table.rate_column();

    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    wtr.write_record(&table.headers)?;

    for (row, target) in table.rows.iter().zip(resolved) {
        let rate = target.rate.map(format_rate).unwrap_or_default();
        wtr.write_record(row.iter().enumerate().map(|(i, field)| {
            if i == rate_column {
                rate.as_str()
            } else {
                field
            }
        }))?;
    }

    wtr.into_inner().map_err(|e| e.into_error())
}

/// Render the whole table first, then hand it over in one write.
pub fn write_output(
    table: &TargetTable,
    resolved: &[ResolvedTarget],
    delimiter: u8,
    destination: &Destination,
) -> Result<()> {
    let to_write_error = |source| SlcspError::Write {
        destination: destination.to_string(),
        source,
    };

    let bytes = render(table, resolved, delimiter).map_err(to_write_error)?;
    match destination {
        Destination::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(&bytes)
                .and_then(|_| out.flush())
                .map_err(to_write_error)?;
        }
        Destination::File(path) => fs::write(path, &bytes).map_err(to_write_error)?,
    }

    info!(rows = resolved.len(), %destination, "wrote output");
    Ok(())
}
