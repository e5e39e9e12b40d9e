use log::debug;

use std::collections::{BTreeSet, HashMap};

use crate::filter::FilteredView;
use crate::table::*;

/// Number of rows per distinct value of a column.
///
/// Sorted by decreasing count. Values with the same count keep their order of first appearance.
pub fn value_counts(view: &FilteredView, column: &str) -> Result<Vec<(String, u64)>, TableError> {
    let mut res: Vec<(String, u64)> = group_rows(view, column)?
        .into_iter()
        .map(|(k, rows)| (k, rows.len() as u64))
        .collect();
    // The sort is stable.
    res.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(res)
}

/// The row indices for each distinct value of a column, in order of first appearance.
pub fn group_rows(
    view: &FilteredView,
    column: &str,
) -> Result<Vec<(String, Vec<usize>)>, TableError> {
    let cells = view.column(column)?;
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut res: Vec<(String, Vec<usize>)> = Vec::new();
    for (cell, row_idx) in cells.iter().zip(view.row_indices()) {
        let k = cell.as_key();
        match positions.get(&k) {
            Some(pos) => res[*pos].1.push(*row_idx),
            None => {
                positions.insert(k.clone(), res.len());
                res.push((k, vec![*row_idx]));
            }
        }
    }
    Ok(res)
}

/// A dense matrix of counts.
///
/// Invariant: `counts` has one line per row label and one entry per column label in each line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PivotMatrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl PivotMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.counts[r][c])
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Counts the rows for each (row_column, col_column) pair.
///
/// The labels on both axes are sorted. The pairs that never occur are filled with zeros.
pub fn pivot_counts(
    view: &FilteredView,
    row_column: &str,
    col_column: &str,
) -> Result<PivotMatrix, TableError> {
    let row_cells = view.column(row_column)?;
    let col_cells = view.column(col_column)?;

    let rows: Vec<String> = row_cells
        .iter()
        .map(|c| c.as_key())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    let columns: Vec<String> = col_cells
        .iter()
        .map(|c| c.as_key())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    let row_pos: HashMap<&String, usize> = rows.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let col_pos: HashMap<&String, usize> =
        columns.iter().enumerate().map(|(i, k)| (k, i)).collect();

    let mut counts: Vec<Vec<u64>> = vec![vec![0; columns.len()]; rows.len()];
    for (rc, cc) in row_cells.iter().zip(col_cells.iter()) {
        let r = row_pos[&rc.as_key()];
        let c = col_pos[&cc.as_key()];
        counts[r][c] += 1;
    }
    debug!(
        "pivot_counts: {} x {} matrix over {} rows",
        rows.len(),
        columns.len(),
        view.num_rows()
    );
    Ok(PivotMatrix {
        rows,
        columns,
        counts,
    })
}

/// The label shown for empty cells in a hierarchy.
pub const BLANK_LABEL: &str = "(blank)";

/// One node of a hierarchy.
///
/// `id` is the path of escaped labels joined with '/', `parent` is the id of the parent (empty
/// for the top level). Ids are never empty and two different paths never share an id.
#[derive(PartialEq, Debug, Clone)]
pub struct HierarchyNode {
    pub id: String,
    pub label: String,
    pub parent: String,
    pub value: f64,
    pub color: Option<f64>,
}

/// Rolls up the rows of a view along a path of categorical columns.
///
/// If a value column is given, the nodes are sized by the sum of this column and colored by
/// the average of this column weighted by itself. Otherwise, the nodes are sized by their
/// number of rows and carry no color. Cells without a numeric value count as zero.
///
/// The nodes are returned level by level, each level in order of first appearance.
pub fn hierarchy(
    view: &FilteredView,
    path: &[&str],
    value_column: Option<&str>,
) -> Result<Vec<HierarchyNode>, TableError> {
    let path_cells: Vec<Vec<&Cell>> = path
        .iter()
        .map(|c| view.column(c))
        .collect::<Result<_, _>>()?;
    let values: Option<Vec<f64>> = match value_column {
        Some(c) => Some(
            view.column(c)?
                .iter()
                .map(|cell| cell.as_f64().unwrap_or(0.0))
                .collect(),
        ),
        None => None,
    };

    // (id, label, parent, sum of values, sum of weighted colors)
    let mut levels: Vec<Vec<(String, String, String, f64, f64)>> = vec![vec![]; path.len()];
    let mut positions: Vec<HashMap<String, usize>> = vec![HashMap::new(); path.len()];

    for row in 0..view.num_rows() {
        let v = values.as_ref().map(|vs| vs[row]).unwrap_or(1.0);
        let mut parent = "".to_string();
        for (level, cells) in path_cells.iter().enumerate() {
            let key = cells[row].as_key();
            let id = if level == 0 {
                id_segment(&key)
            } else {
                format!("{}/{}", parent, id_segment(&key))
            };
            let label = if key.is_empty() {
                BLANK_LABEL.to_string()
            } else {
                key
            };
            let pos = match positions[level].get(&id) {
                Some(p) => *p,
                None => {
                    positions[level].insert(id.clone(), levels[level].len());
                    levels[level].push((id.clone(), label, parent.clone(), 0.0, 0.0));
                    levels[level].len() - 1
                }
            };
            let node = &mut levels[level][pos];
            node.3 += v;
            node.4 += v * v;
            parent = id;
        }
    }

    let res: Vec<HierarchyNode> = levels
        .into_iter()
        .flatten()
        .map(|(id, label, parent, value, weighted)| HierarchyNode {
            id,
            label,
            parent,
            value,
            color: if values.is_some() && value > 0.0 {
                Some(weighted / value)
            } else {
                None
            },
        })
        .collect();
    debug!("hierarchy: {:?}: {} nodes", path, res.len());
    Ok(res)
}

/// The part of a node id for one label.
///
/// The separator and the escape character are escaped, and the empty label has its own
/// segment, so that the ids can be split back into the labels.
fn id_segment(label: &str) -> String {
    if label.is_empty() {
        return "\\0".to_string();
    }
    let mut res = String::with_capacity(label.len());
    for ch in label.chars() {
        match ch {
            '\\' => res.push_str("\\\\"),
            '/' => res.push_str("\\/"),
            _ => res.push(ch),
        }
    }
    res
}

/// A set of bins of identical width covering a range of values.
#[derive(PartialEq, Debug, Clone)]
pub struct Bins {
    pub start: f64,
    pub end: f64,
    pub size: f64,
    pub counts: Vec<u64>,
}

/// Splits the range of the values into exactly `num_bins` bins, whatever the range is.
///
/// The last bin includes the maximum. When all the values are equal, the bins have a width of 1
/// starting at this value. Returns None if there is nothing to bin.
pub fn fixed_bins(values: &[f64], num_bins: usize) -> Option<Bins> {
    if values.is_empty() || num_bins == 0 {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let size = if max > min {
        (max - min) / num_bins as f64
    } else {
        1.0
    };
    let mut counts: Vec<u64> = vec![0; num_bins];
    for v in values {
        let idx = ((v - min) / size).floor() as usize;
        counts[idx.min(num_bins - 1)] += 1;
    }
    Some(Bins {
        start: min,
        end: min + size * num_bins as f64,
        size,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::small_table;
    use crate::*;
    use std::collections::HashSet;

    fn s(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    fn text(x: &str) -> Cell {
        Cell::Text(x.to_string())
    }

    fn region_table() -> Table {
        let rows = vec![
            ("X", "C1", "Alice", 2),
            ("X", "C1", "Bob", 0),
            ("X", "C2", "Carol", 4),
            ("Y", "C3", "Dan", 1),
        ];
        Table::new(
            s(&[DISTRICT, CONSTITUENCY, CANDIDATE, CASES_TOTAL]),
            rows.into_iter()
                .map(|(d, c, n, k)| vec![text(d), text(c), text(n), Cell::Int(k)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn example_aggregates() {
        let t = small_table();
        let sel = Selection::new(&s(&["A"]), &s(&["M", "F"]), &s(&["X", "Y"]));
        let view = apply_filter(&t, &sel).unwrap();
        assert_eq!(
            value_counts(&view, PARTY).unwrap(),
            vec![("A".to_string(), 2)]
        );
        let pivot = pivot_counts(&view, DISTRICT, PARTY).unwrap();
        assert_eq!(pivot.rows, s(&["X", "Y"]));
        assert_eq!(pivot.columns, s(&["A"]));
        assert_eq!(pivot.counts, vec![vec![1], vec![1]]);
    }

    #[test]
    fn counts_sum_to_rows() {
        let t = small_table();
        let view = FilteredView::full(&t);
        let counts = value_counts(&view, PARTY).unwrap();
        assert_eq!(counts.iter().map(|p| p.1).sum::<u64>(), 3);
        // A appears twice, B once.
        assert_eq!(counts[0], ("A".to_string(), 2));

        let pivot = pivot_counts(&view, DISTRICT, PARTY).unwrap();
        assert_eq!(pivot.total(), 3);
        assert_eq!(pivot.get("Y", "B"), Some(0));
        assert_eq!(pivot.get("X", "B"), Some(1));
        assert_eq!(pivot.get("Z", "B"), None);
        for line in pivot.counts.iter() {
            assert_eq!(line.len(), pivot.columns.len());
        }
    }

    #[test]
    fn ties_keep_appearance_order() {
        let t = Table::new(
            s(&[PARTY]),
            ["C", "B", "A", "B", "C"]
                .iter()
                .map(|x| vec![text(x)])
                .collect(),
        )
        .unwrap();
        let counts = value_counts(&FilteredView::full(&t), PARTY).unwrap();
        assert_eq!(
            counts,
            vec![
                ("C".to_string(), 2),
                ("B".to_string(), 2),
                ("A".to_string(), 1)
            ]
        );
    }

    #[test]
    fn empty_view_aggregates() {
        let t = small_table();
        let view = apply_filter(&t, &Selection::new(&[], &s(&["M"]), &s(&["X"]))).unwrap();
        assert!(value_counts(&view, PARTY).unwrap().is_empty());
        let pivot = pivot_counts(&view, DISTRICT, PARTY).unwrap();
        assert!(pivot.rows.is_empty() && pivot.columns.is_empty());
        assert_eq!(pivot.total(), 0);
        assert!(hierarchy(&view, &[PARTY, GENDER], None).unwrap().is_empty());
    }

    #[test]
    fn group_rows_by_value() {
        let t = small_table();
        let groups = group_rows(&FilteredView::full(&t), GENDER).unwrap();
        assert_eq!(
            groups,
            vec![("M".to_string(), vec![0]), ("F".to_string(), vec![1, 2])]
        );
    }

    #[test]
    fn hierarchy_with_values() {
        let _ = env_logger::try_init();
        let t = region_table();
        let view = FilteredView::full(&t);
        let nodes = hierarchy(&view, &[DISTRICT, CONSTITUENCY, CANDIDATE], Some(CASES_TOTAL))
            .unwrap();
        assert_eq!(nodes.len(), 2 + 3 + 4);
        let x = &nodes[0];
        assert_eq!((x.id.as_str(), x.parent.as_str()), ("X", ""));
        assert_eq!(x.value, 6.0);
        // (2*2 + 0 + 4*4) / 6
        assert_eq!(x.color, Some(20.0 / 6.0));
        let c1 = nodes.iter().find(|n| n.id == "X/C1").unwrap();
        assert_eq!((c1.label.as_str(), c1.parent.as_str()), ("C1", "X"));
        assert_eq!(c1.value, 2.0);
        let bob = nodes.iter().find(|n| n.id == "X/C1/Bob").unwrap();
        assert_eq!(bob.value, 0.0);
        assert_eq!(bob.color, None);
    }

    #[test]
    fn hierarchy_with_counts() {
        let t = small_table();
        let nodes = hierarchy(&FilteredView::full(&t), &[PARTY, GENDER], None).unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "A/M", "B/F", "A/F"]);
        assert_eq!(nodes[0].value, 2.0);
        assert!(nodes.iter().all(|n| n.color.is_none()));
    }

    #[test]
    fn hierarchy_blank_labels() {
        let t = Table::new(
            s(&[DISTRICT, CONSTITUENCY, CANDIDATE, CASES_TOTAL]),
            vec![vec![Cell::Empty, text("C1"), text("Ann"), Cell::Int(2)]],
        )
        .unwrap();
        let nodes = hierarchy(
            &FilteredView::full(&t),
            &[DISTRICT, CONSTITUENCY, CANDIDATE],
            Some(CASES_TOTAL),
        )
        .unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let parents: Vec<&str> = nodes.iter().map(|n| n.parent.as_str()).collect();
        assert_eq!(ids, vec!["\\0", "\\0/C1", "\\0/C1/Ann"]);
        assert_eq!(parents, vec!["", "\\0", "\\0/C1"]);
        assert_eq!(nodes[0].label, BLANK_LABEL);
        assert!(nodes.iter().all(|n| !n.id.is_empty()));
    }

    #[test]
    fn hierarchy_ids_are_unique() {
        let t = Table::new(
            s(&[DISTRICT, CONSTITUENCY]),
            vec![
                vec![text("A/B"), text("C")],
                vec![text("A"), text("B")],
                vec![text("A"), text("B/C")],
                vec![text("A\\"), text("/B")],
            ],
        )
        .unwrap();
        let nodes = hierarchy(&FilteredView::full(&t), &[DISTRICT, CONSTITUENCY], None).unwrap();
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        // 3 districts and 4 constituencies.
        assert_eq!(nodes.len(), 7);
        assert_eq!(ids.len(), 7);
        let a_b = nodes.iter().find(|n| n.id == "A\\/B").unwrap();
        assert_eq!(a_b.label, "A/B");
        assert_eq!(a_b.parent, "");
    }

    #[test]
    fn hierarchy_missing_column() {
        let t = small_table();
        let res = hierarchy(&FilteredView::full(&t), &[PARTY, EDUCATION], None);
        assert_eq!(
            res.unwrap_err(),
            TableError::MissingColumn {
                column: EDUCATION.to_string()
            }
        );
    }

    #[test]
    fn bins_have_fixed_count() {
        let ages: Vec<f64> = vec![25.0, 30.0, 31.0, 45.0, 70.0, 85.0];
        let bins = fixed_bins(&ages, 30).unwrap();
        assert_eq!(bins.counts.len(), 30);
        assert_eq!(bins.counts.iter().sum::<u64>(), 6);
        assert_eq!(bins.start, 25.0);
        assert_eq!(bins.size, 2.0);
        // The maximum falls in the last bin.
        assert_eq!(bins.counts[29], 1);

        let narrow = fixed_bins(&[40.0, 41.0], 30).unwrap();
        assert_eq!(narrow.counts.len(), 30);

        let constant = fixed_bins(&[50.0, 50.0], 30).unwrap();
        assert_eq!(constant.size, 1.0);
        assert_eq!(constant.counts[0], 2);

        assert_eq!(fixed_bins(&[], 30), None);
    }
}
