use log::info;
use snafu::prelude::*;
use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;

use crate::dashboard::*;
use candidate_stats::Cell;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The name of a column from the raw content of its header cell.
/// Blank headers get a positional name, since the names must be unique.
pub fn header_name(idx: usize, raw: Option<String>) -> String {
    match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => format!("Unnamed: {}", idx),
    }
}

pub fn cell_to_json(cell: &Cell) -> JSValue {
    match cell {
        Cell::Empty => JSValue::Null,
        Cell::Bool(b) => json!(b),
        Cell::Int(i) => json!(i),
        // Non-finite numbers have no JSON representation.
        Cell::Float(f) if f.is_finite() => json!(f),
        Cell::Float(_) => JSValue::Null,
        Cell::Text(s) => json!(s),
    }
}

/// Writes the content to the given path, or to the standard output if the path is 'stdout'.
pub fn write_output(path: &str, content: &str) -> DashboardResult<()> {
    if path == "stdout" {
        println!("{}", content);
        return Ok(());
    }
    info!("Writing {} bytes to {:?}", content.len(), path);
    fs::write(path, content).context(WritingOutputSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_headers_are_named() {
        assert_eq!(header_name(0, Some("Party".to_string())), "Party");
        assert_eq!(header_name(3, Some("  ".to_string())), "Unnamed: 3");
        assert_eq!(header_name(4, None), "Unnamed: 4");
    }

    #[test]
    fn cells_to_json() {
        assert_eq!(cell_to_json(&Cell::Empty), JSValue::Null);
        assert_eq!(cell_to_json(&Cell::Int(3)), json!(3));
        assert_eq!(cell_to_json(&Cell::Float(f64::NAN)), JSValue::Null);
        assert_eq!(cell_to_json(&Cell::Text("AAP".to_string())), json!("AAP"));
    }

    #[test]
    fn file_names() {
        assert_eq!(
            simplify_file_name("data/Delhi Assembly 2025 Candidates Data.xls"),
            "Delhi Assembly 2025 Candidates Data.xls"
        );
    }
}
