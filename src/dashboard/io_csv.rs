// Primitives for reading CSV files.

use log::{debug, info};
use snafu::prelude::*;

use crate::dashboard::io_common::header_name;
use crate::dashboard::*;
use candidate_stats::Cell;

/// Reads the header and the rows of a CSV file. The type of each cell is inferred from its content.
pub fn read_csv_table(path: &str) -> DashboardResult<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .clone();
    debug!("read_csv_table: header: {:?}", header);
    if header.is_empty() {
        return MissingHeaderSnafu { path }.fail();
    }
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, s)| header_name(idx, Some(s.to_string())))
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<Cell> = line.iter().map(Cell::infer).collect();
        if cells.iter().all(|c| c.is_empty()) {
            debug!("read_csv_table: skipping blank line {}", lineno);
            continue;
        }
        rows.push(cells);
    }
    info!(
        "read_csv_table: {:?}: {} columns, {} rows",
        path,
        columns.len(),
        rows.len()
    );
    Ok((columns, rows))
}
