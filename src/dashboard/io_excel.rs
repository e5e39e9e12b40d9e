// Primitives for reading spreadsheets.

use calamine::{open_workbook_auto, DataType, Range, Reader};
use log::{debug, info, warn};
use snafu::prelude::*;

use crate::dashboard::io_common::header_name;
use crate::dashboard::*;
use candidate_stats::Cell;

/// Reads the header and the rows of a worksheet.
///
/// The first worksheet is used if no name is provided.
pub fn read_excel_table(
    path: &str,
    worksheet_name: Option<&str>,
) -> DashboardResult<(Vec<String>, Vec<Vec<Cell>>)> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header = iter.next().context(MissingHeaderSnafu { path })?;
    debug!("read_excel_table: header: {:?}", header);
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, dt)| header_name(idx, read_header_cell(dt)))
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cells: Vec<Cell> = row.iter().map(|dt| read_cell(dt, idx + 2)).collect();
        // Fully blank lines at the end of a sheet are not records.
        if cells.iter().all(|c| c.is_empty()) {
            debug!("read_excel_table: skipping blank line {}", idx + 2);
            continue;
        }
        rows.push(cells);
    }
    info!(
        "read_excel_table: {:?}: {} columns, {} rows",
        path,
        columns.len(),
        rows.len()
    );
    Ok((columns, rows))
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> DashboardResult<Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook = open_workbook_auto(path).context(OpeningWorkbookSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningWorkbookSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyWorkbookSnafu { path })?
            .context(OpeningWorkbookSnafu { path })
    }
}

fn read_header_cell(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn read_cell(cell: &DataType, lineno: usize) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        DataType::Bool(b) => Cell::Bool(*b),
        DataType::Int(i) => Cell::Int(*i),
        DataType::Float(f) => Cell::Float(*f),
        // Dates are kept as their serial number.
        DataType::DateTime(f) => Cell::Float(*f),
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Error(e) => {
            warn!("read_excel_table: line {}: error cell {:?}", lineno, e);
            Cell::Empty
        }
        #[allow(unreachable_patterns)]
        _ => {
            warn!("read_excel_table: line {}: unsupported cell {:?}", lineno, cell);
            Cell::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/candidates.xlsx");

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn first_worksheet() {
        let _ = env_logger::try_init();
        let (columns, rows) = read_excel_table(FIXTURE, None).unwrap();
        // The header is kept as written, normalization happens later.
        assert_eq!(columns, vec!["Candidate ", "Party", "Gender", "District", "Age"]);
        // The blank third line is skipped.
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec![text("Alice"), text("AAP"), text("F"), text("New Delhi"), Cell::Float(45.0)]
        );
        assert_eq!(
            rows[1],
            vec![text("Bob"), text("BJP"), text("M"), Cell::Empty, Cell::Float(52.0)]
        );
        assert_eq!(rows[2][4], Cell::Float(38.5));
    }

    #[test]
    fn named_worksheet() {
        let (columns, rows) = read_excel_table(FIXTURE, Some("Alt")).unwrap();
        assert_eq!(columns, vec!["Party", "Gender", "District"]);
        assert_eq!(rows, vec![vec![text("INC"), text("F"), text("North East")]]);

        let (columns, _) = read_excel_table(FIXTURE, Some("Candidates")).unwrap();
        assert_eq!(columns[0], "Candidate ");
    }

    #[test]
    fn missing_worksheet() {
        let res = read_excel_table(FIXTURE, Some("Sheet9"));
        assert!(matches!(
            res,
            Err(DashboardError::MissingWorksheet { name, .. }) if name == "Sheet9"
        ));
    }

    #[test]
    fn spreadsheet_cells() {
        assert_eq!(read_cell(&DataType::Float(45.0), 2), Cell::Float(45.0));
        assert_eq!(
            read_cell(&DataType::String("AAP".to_string()), 2),
            Cell::Text("AAP".to_string())
        );
        assert_eq!(read_cell(&DataType::String(" ".to_string()), 2), Cell::Empty);
        assert_eq!(read_cell(&DataType::Empty, 2), Cell::Empty);
        assert_eq!(
            read_header_cell(&DataType::String(" Party ".to_string())),
            Some(" Party ".to_string())
        );
        assert_eq!(read_header_cell(&DataType::Empty), None);
    }

    #[test]
    fn missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("missing.xlsx");
        let res = read_excel_table(p.to_str().unwrap(), None);
        assert!(matches!(res, Err(DashboardError::OpeningWorkbook { .. })));
    }

    #[test]
    fn malformed_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.xlsx");
        std::fs::write(&p, "this is not a spreadsheet").unwrap();
        let res = read_excel_table(p.to_str().unwrap(), None);
        assert!(matches!(res, Err(DashboardError::OpeningWorkbook { .. })));
    }
}
