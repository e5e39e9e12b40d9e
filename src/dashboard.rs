use log::{debug, info, warn};

use candidate_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dashboard::charts::{ChartKind, ChartOutput, AGE_BINS};
use crate::dashboard::config_reader::*;
use crate::dashboard::page::PageMode;

pub mod charts;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
pub mod page;
pub mod server;

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("Error opening file {path}"))]
    OpeningWorkbook {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyWorkbook { path: String },
    #[snafu(display("Cannot find the worksheet {name} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The file {path} has no header row"))]
    MissingHeader { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown input type {input_type:?}, expected excel or csv"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Invalid candidate data: {source}"))]
    InvalidTable { source: TableError },
    #[snafu(display("Unknown filter {dimension:?}, expected Party, Gender or District"))]
    UnknownDimension { dimension: String },
    #[snafu(display("Error serializing a figure"))]
    SerializingFigure { source: serde_json::Error },
    #[snafu(display("Error starting the server runtime"))]
    StartingRuntime { source: std::io::Error },
    #[snafu(display("Cannot listen on {addr}"))]
    Binding {
        source: std::io::Error,
        addr: String,
    },
    #[snafu(display("Error while serving the dashboard"))]
    Serving { source: std::io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Loads the candidates. This is done once, and the table is then shared by all the views.
pub fn load_table(source: &DataSource) -> DashboardResult<Table> {
    info!(
        "Attempting to read candidates from {} ({:?})",
        io_common::simplify_file_name(&source.path),
        source.input_type
    );
    let (raw_columns, rows) = match source.input_type {
        InputType::Excel => {
            io_excel::read_excel_table(&source.path, source.worksheet_name.as_deref())?
        }
        InputType::Csv => io_csv::read_csv_table(&source.path)?,
    };
    let columns = normalize_column_names(&raw_columns);
    debug!("load_table: columns: {:?}", columns);
    Table::new(columns, rows).context(InvalidTableSnafu {})
}

/// A request to change the selected values of one dimension.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FilterChange {
    pub dimension: Dimension,
    pub values: Vec<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum PanelContent {
    Chart(ChartOutput),
    /// The chart could not be drawn. The other panels are not affected.
    Failed(String),
}

/// One of the ten panels of the dashboard.
#[derive(PartialEq, Debug, Clone)]
pub struct Panel {
    pub kind: ChartKind,
    pub content: PanelContent,
}

/// The state of the dashboard: the loaded table, the current selection and the panels drawn for it.
///
/// The panels are only recomputed when the selection changes.
pub struct Dashboard<'a> {
    table: &'a Table,
    options: FilterOptions,
    selection: Selection,
    num_selected: usize,
    panels: Vec<Panel>,
}

impl<'a> Dashboard<'a> {
    /// Builds the dashboard with all the observed values selected, and draws all the panels.
    pub fn new(table: &'a Table) -> DashboardResult<Dashboard<'a>> {
        let options = FilterOptions::observed(table).context(InvalidTableSnafu {})?;
        info!(
            "Dashboard: {} candidates, {} parties, {} genders, {} districts",
            table.num_rows(),
            options.party.len(),
            options.gender.len(),
            options.district.len()
        );
        let selection = Selection::all(&options);
        let mut dashboard = Dashboard {
            table,
            options,
            selection,
            num_selected: 0,
            panels: Vec::new(),
        };
        dashboard.redraw()?;
        Ok(dashboard)
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// The number of candidates in the current view.
    pub fn num_selected(&self) -> usize {
        self.num_selected
    }

    /// The candidates matching the current selection.
    pub fn view(&self) -> DashboardResult<FilteredView<'a>> {
        apply_filter(self.table, &self.selection).context(InvalidTableSnafu {})
    }

    /// Handles a change of one of the filter widgets.
    ///
    /// Returns true if the selection changed and the panels were redrawn.
    pub fn on_filter_change(&mut self, change: &FilterChange) -> DashboardResult<bool> {
        for v in change.values.iter() {
            if !self.options.get(change.dimension).contains(v) {
                warn!(
                    "on_filter_change: {:?} {:?} does not appear in the data",
                    change.dimension, v
                );
            }
        }
        if !self.selection.set(change.dimension, &change.values) {
            debug!("on_filter_change: {:?} unchanged", change.dimension);
            return Ok(false);
        }
        info!(
            "on_filter_change: {:?} -> {:?}",
            change.dimension,
            self.selection.ordered(change.dimension, &self.options)
        );
        self.redraw()?;
        Ok(true)
    }

    fn redraw(&mut self) -> DashboardResult<()> {
        let view = self.view()?;
        if view.is_empty() {
            warn!("redraw: the current selection does not match any candidate");
        }
        self.num_selected = view.num_rows();
        self.panels = ChartKind::ALL
            .iter()
            .map(|kind| {
                let content = match kind.render(&view) {
                    Ok(out) => PanelContent::Chart(out),
                    Err(e) => {
                        warn!("redraw: cannot draw {:?}: {}", kind, e);
                        PanelContent::Failed(format!("Cannot draw this chart: {}", e))
                    }
                };
                Panel {
                    kind: *kind,
                    content,
                }
            })
            .collect();
        Ok(())
    }

    /// A summary of the current view in JSON.
    pub fn summary_js(&self) -> DashboardResult<JSValue> {
        let view = self.view()?;

        let mut selection: JSMap<String, JSValue> = JSMap::new();
        for dim in Dimension::ALL {
            selection.insert(
                dim.column().to_string(),
                json!(self.selection.ordered(dim, &self.options)),
            );
        }

        let party_counts = value_counts(&view, PARTY).context(InvalidTableSnafu {})?;
        let gender_counts = value_counts(&view, GENDER).context(InvalidTableSnafu {})?;
        let pivot = pivot_counts(&view, DISTRICT, PARTY).context(InvalidTableSnafu {})?;

        // The age is optional for the summary.
        let age_histogram: JSValue = match view.column(AGE) {
            Ok(cells) => {
                let ages: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
                match fixed_bins(&ages, AGE_BINS) {
                    Some(b) => json!({
                        "start": b.start,
                        "end": b.end,
                        "size": b.size,
                        "counts": b.counts,
                    }),
                    None => JSValue::Null,
                }
            }
            Err(e) => {
                warn!("summary_js: no age histogram: {}", e);
                JSValue::Null
            }
        };

        Ok(json!({
            "rows": { "total": self.table.num_rows(), "selected": view.num_rows() },
            "selection": selection,
            "partyCounts": counts_to_json(&party_counts),
            "genderCounts": counts_to_json(&gender_counts),
            "districtPartyCounts": {
                "districts": pivot.rows,
                "parties": pivot.columns,
                "counts": pivot.counts,
            },
            "ageHistogram": age_histogram,
        }))
    }
}

/// The counts as [name, count] pairs, keeping their order.
fn counts_to_json(counts: &[(String, u64)]) -> JSValue {
    JSValue::Array(
        counts
            .iter()
            .map(|(name, count)| json!([name, count]))
            .collect(),
    )
}

fn read_summary(path: &str) -> DashboardResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: content: {:?}", contents);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

/// Compares a summary with the reference stored at the given path.
fn check_summary(summary: &JSValue, reference_path: &str) -> DashboardResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    // The summary goes through the same parsing as the reference.
    let written = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    let reparsed: JSValue = serde_json::from_str(written.as_str()).context(ParsingJsonSnafu {})?;
    let pretty = serde_json::to_string_pretty(&reparsed).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty {
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
        whatever!("Difference detected between the computed summary and the reference summary")
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

pub fn run_dashboard(args: &Args) -> DashboardResult<()> {
    let config = match &args.config {
        Some(p) => Some((p.as_str(), read_config(p)?)),
        None => None,
    };
    let settings = resolve_settings(args, config)?;
    info!("settings: {:?}", settings);

    // The table is loaded once and lives as long as the process.
    let table: &'static Table = Box::leak(Box::new(load_table(&settings.data)?));
    let mut dashboard = Dashboard::new(table)?;
    for change in settings.filters.iter() {
        dashboard.on_filter_change(change)?;
    }

    if let Some(p) = &settings.output_path {
        let html = page::render_page(&settings.page, &dashboard, PageMode::Static);
        io_common::write_output(p, &html)?;
    }

    if settings.summary_path.is_some() || settings.reference_path.is_some() {
        let summary = dashboard.summary_js()?;
        if let Some(p) = &settings.summary_path {
            let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
            io_common::write_output(p, &pretty)?;
        }
        if let Some(p) = &settings.reference_path {
            check_summary(&summary, p)?;
        }
    }

    if let Some(addr) = &settings.serve_address {
        let runtime = tokio::runtime::Runtime::new().context(StartingRuntimeSnafu {})?;
        runtime.block_on(server::serve(dashboard, settings.page.clone(), addr))?;
    }
    Ok(())
}
