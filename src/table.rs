use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::{fmt, fs::File, io::Read, path::Path};

use crate::error::{Result, SlcspError};

/// Which of the three input tables a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Plans,
    Zips,
    Targets,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::Plans => "plans",
            Table::Zips => "zips",
            Table::Targets => "targets",
        })
    }
}

/// Header row required, every field and header trimmed, rows must match the header width.
fn builder(delimiter: u8) -> ReaderBuilder {
    let mut b = ReaderBuilder::new();
    b.delimiter(delimiter).has_headers(true).trim(Trim::All);
    b
}

pub fn open(table: Table, path: &Path, delimiter: u8) -> Result<Reader<File>> {
    builder(delimiter)
        .from_path(path)
        .map_err(|source| SlcspError::Open {
            table,
            path: path.to_path_buf(),
            source,
        })
}

pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Reader<R> {
    builder(delimiter).from_reader(reader)
}

pub fn headers<R: Read>(table: Table, rdr: &mut Reader<R>) -> Result<StringRecord> {
    rdr.headers()
        .cloned()
        .map_err(|e| SlcspError::parse(table, e))
}

/// Position of the column named `column` in `headers`.
pub fn column_index(table: Table, headers: &StringRecord, column: &'static str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or(SlcspError::MissingColumn { table, column })
}

/// Fail on the first of `columns` that `headers` lacks, before any row is read.
pub fn require_columns(
    table: Table,
    headers: &StringRecord,
    columns: &[&'static str],
) -> Result<()> {
    for &column in columns {
        column_index(table, headers, column)?;
    }
    Ok(())
}

/// Line number of `record` in its source, 0 when unknown.
pub fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_and_fields_are_trimmed() {
        let data = " zipcode , rate\n 64148 ,\n";
        let mut rdr = from_reader(data.as_bytes(), b',');
        let headers = headers(Table::Targets, &mut rdr).unwrap();
        assert_eq!(column_index(Table::Targets, &headers, "zipcode").unwrap(), 0);
        assert_eq!(column_index(Table::Targets, &headers, "rate").unwrap(), 1);

        let rec = rdr.records().next().unwrap().unwrap();
        assert_eq!(&rec[0], "64148");
        assert_eq!(&rec[1], "");
        assert_eq!(line_of(&rec), 2);
    }

    #[test]
    fn missing_column_is_reported() {
        let mut rdr = from_reader("zip,rate\n".as_bytes(), b',');
        let headers = headers(Table::Targets, &mut rdr).unwrap();
        let err = column_index(Table::Targets, &headers, "zipcode").unwrap_err();
        assert!(matches!(
            err,
            SlcspError::MissingColumn {
                column: "zipcode",
                ..
            }
        ));
    }

    #[test]
    fn require_columns_reports_first_missing() {
        let mut rdr = from_reader("state,metal_level\n".as_bytes(), b',');
        let headers = headers(Table::Plans, &mut rdr).unwrap();
        let err = require_columns(Table::Plans, &headers, &["state", "rate_area", "rate"])
            .unwrap_err();
        assert!(matches!(
            err,
            SlcspError::MissingColumn {
                table: Table::Plans,
                column: "rate_area"
            }
        ));
        assert!(require_columns(Table::Plans, &headers, &["metal_level", "state"]).is_ok());
    }

    #[test]
    fn alternate_delimiter() {
        let mut rdr = from_reader("zipcode\trate\n1\t2\n".as_bytes(), b'\t');
        let rec = rdr.records().next().unwrap().unwrap();
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn open_missing_file_fails() {
        let err = open(Table::Plans, Path::new("/nonexistent/plans.csv"), b',').unwrap_err();
        assert!(matches!(err, SlcspError::Open { table: Table::Plans, .. }));
    }
}
