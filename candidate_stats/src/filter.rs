use log::debug;

use std::collections::HashSet;

use crate::table::*;
use crate::{DISTRICT, GENDER, PARTY};

/// The categorical dimensions that can be filtered on.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Dimension {
    Party,
    Gender,
    District,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Party, Dimension::Gender, Dimension::District];

    /// The name of the column holding this dimension.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Party => PARTY,
            Dimension::Gender => GENDER,
            Dimension::District => DISTRICT,
        }
    }

    /// The dimension for a column name, ignoring the case.
    pub fn from_name(name: &str) -> Option<Dimension> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.column().eq_ignore_ascii_case(name.trim()))
    }

    /// The label of the selection widget.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Party => "Select Parties",
            Dimension::Gender => "Select Gender",
            Dimension::District => "Select Districts",
        }
    }
}

/// All the values observed for each dimension, in order of first appearance.
///
/// It is computed once from the full table and populates the selection widgets.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FilterOptions {
    pub party: Vec<String>,
    pub gender: Vec<String>,
    pub district: Vec<String>,
}

impl FilterOptions {
    pub fn observed(table: &Table) -> Result<FilterOptions, TableError> {
        Ok(FilterOptions {
            party: table.distinct_values(PARTY)?,
            gender: table.distinct_values(GENDER)?,
            district: table.distinct_values(DISTRICT)?,
        })
    }

    pub fn get(&self, dim: Dimension) -> &[String] {
        match dim {
            Dimension::Party => &self.party,
            Dimension::Gender => &self.gender,
            Dimension::District => &self.district,
        }
    }
}

/// The values currently selected for each dimension.
///
/// An empty set selects nothing: it does not disable the filter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Selection {
    party: HashSet<String>,
    gender: HashSet<String>,
    district: HashSet<String>,
}

impl Selection {
    /// Selects everything that was observed.
    pub fn all(options: &FilterOptions) -> Selection {
        Selection {
            party: options.party.iter().cloned().collect(),
            gender: options.gender.iter().cloned().collect(),
            district: options.district.iter().cloned().collect(),
        }
    }

    pub fn new(party: &[String], gender: &[String], district: &[String]) -> Selection {
        Selection {
            party: party.iter().cloned().collect(),
            gender: gender.iter().cloned().collect(),
            district: district.iter().cloned().collect(),
        }
    }

    pub fn get(&self, dim: Dimension) -> &HashSet<String> {
        match dim {
            Dimension::Party => &self.party,
            Dimension::Gender => &self.gender,
            Dimension::District => &self.district,
        }
    }

    /// Replaces the selected values of one dimension.
    /// Returns true if the selection changed.
    pub fn set(&mut self, dim: Dimension, values: &[String]) -> bool {
        let new_values: HashSet<String> = values.iter().cloned().collect();
        let current = match dim {
            Dimension::Party => &mut self.party,
            Dimension::Gender => &mut self.gender,
            Dimension::District => &mut self.district,
        };
        if *current == new_values {
            false
        } else {
            *current = new_values;
            true
        }
    }

    /// The selected values of a dimension, following the order of the options.
    /// Selected values that were never observed come last, sorted.
    pub fn ordered(&self, dim: Dimension, options: &FilterOptions) -> Vec<String> {
        let selected = self.get(dim);
        let opts = options.get(dim);
        let mut res: Vec<String> = opts
            .iter()
            .filter(|v| selected.contains(*v))
            .cloned()
            .collect();
        let mut extra: Vec<String> = selected
            .iter()
            .filter(|v| !opts.contains(v))
            .cloned()
            .collect();
        extra.sort();
        res.extend(extra);
        res
    }
}

/// A subset of the rows of a table. The table itself is never modified.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a Table,
    rows: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over all the rows.
    pub fn full(table: &'a Table) -> FilteredView<'a> {
        FilteredView {
            table,
            rows: (0..table.num_rows()).collect(),
        }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [Cell]> + '_ {
        let table = self.table;
        self.rows.iter().map(move |idx| table.row(*idx))
    }

    /// The cells of one column, for the rows of this view.
    pub fn column(&self, name: &str) -> Result<Vec<&'a Cell>, TableError> {
        let col = self.table.column_index(name)?;
        Ok(self.rows().map(|row| &row[col]).collect())
    }

    /// Restricts this view further to the rows for which the cell in the given column
    /// satisfies the predicate.
    pub fn retain_by<F>(&self, name: &str, pred: F) -> Result<FilteredView<'a>, TableError>
    where
        F: Fn(&Cell) -> bool,
    {
        let col = self.table.column_index(name)?;
        let rows: Vec<usize> = self
            .rows
            .iter()
            .cloned()
            .filter(|idx| pred(&self.table.row(*idx)[col]))
            .collect();
        Ok(FilteredView {
            table: self.table,
            rows,
        })
    }
}

/// Returns the rows whose party, gender and district are all in the selection.
pub fn apply_filter<'a>(
    table: &'a Table,
    selection: &Selection,
) -> Result<FilteredView<'a>, TableError> {
    let party_idx = table.column_index(PARTY)?;
    let gender_idx = table.column_index(GENDER)?;
    let district_idx = table.column_index(DISTRICT)?;

    let rows: Vec<usize> = (0..table.num_rows())
        .filter(|idx| {
            let row = table.row(*idx);
            selection.party.contains(&row[party_idx].as_key())
                && selection.gender.contains(&row[gender_idx].as_key())
                && selection.district.contains(&row[district_idx].as_key())
        })
        .collect();
    debug!(
        "apply_filter: kept {} of {} rows",
        rows.len(),
        table.num_rows()
    );
    Ok(FilteredView { table, rows })
}
