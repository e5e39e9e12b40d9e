// The chart renderers.
//
// Each renderer is a pure function from the filtered candidates (or an aggregate of them)
// to a Plotly figure in JSON: {"data": [traces], "layout": {...}}. Drawing is left to plotly.js.
// The treemap, sunburst and violin traces are not available in the plotly crate and are
// written directly in JSON.

use candidate_stats::*;
use log::debug;
use snafu::prelude::*;

use plotly::common::{ColorScale, ColorScalePalette, Mode, TextPosition, Title};
use plotly::histogram::Bins as HistogramBins;
use plotly::layout::themes::BuiltinTheme;
use plotly::layout::{Axis, BarMode, BoxMode, Layout, Legend};
use plotly::{Bar, BoxPlot, HeatMap, Histogram, Pie, Plot, Scatter};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::dashboard::io_common::cell_to_json;
use crate::dashboard::{DashboardResult, InvalidTableSnafu, SerializingFigureSnafu};

/// The number of bins of the age histogram, whatever the range of ages.
pub const AGE_BINS: usize = 30;

pub const NO_CASES_NOTICE: &str = "No candidates with criminal cases to show in the sunburst chart.";

/// What a renderer produces.
#[derive(PartialEq, Debug, Clone)]
pub enum ChartOutput {
    Figure(JSValue),
    /// Nothing to draw: the chart backend is not called and this message is shown instead.
    Notice(String),
}

/// The ten charts of the dashboard, in display order.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChartKind {
    PartyBar,
    CasesTreemap,
    CasesSunburst,
    AssetsViolin,
    GenderPie,
    AgeHistogram,
    AssetsBox,
    DistrictPartyHeatmap,
    AgeAssetsScatter,
    EducationSunburst,
}

impl ChartKind {
    pub const ALL: [ChartKind; 10] = [
        ChartKind::PartyBar,
        ChartKind::CasesTreemap,
        ChartKind::CasesSunburst,
        ChartKind::AssetsViolin,
        ChartKind::GenderPie,
        ChartKind::AgeHistogram,
        ChartKind::AssetsBox,
        ChartKind::DistrictPartyHeatmap,
        ChartKind::AgeAssetsScatter,
        ChartKind::EducationSunburst,
    ];

    pub fn subheader(&self) -> &'static str {
        match self {
            ChartKind::PartyBar => "1. Candidates by Party",
            ChartKind::CasesTreemap => "2. Treemap – Criminal Cases by Region",
            ChartKind::CasesSunburst => "3. Sunburst – Criminal Cases by Location",
            ChartKind::AssetsViolin => "4. Violin Plot – Assets by Gender",
            ChartKind::GenderPie => "5. Gender Distribution of Candidates",
            ChartKind::AgeHistogram => "6. Age Distribution of Candidates",
            ChartKind::AssetsBox => "7. Box Plot – Total Assets by Party",
            ChartKind::DistrictPartyHeatmap => "8. Heatmap – Candidate Count by District & Party",
            ChartKind::AgeAssetsScatter => "9. Scatter Plot – Age vs Total Assets",
            ChartKind::EducationSunburst => "10. Sunburst - Party > Education > Gender",
        }
    }

    pub fn render(&self, view: &FilteredView) -> DashboardResult<ChartOutput> {
        debug!("render: {:?} over {} rows", self, view.num_rows());
        match self {
            ChartKind::PartyBar => {
                party_bar(&value_counts(view, PARTY).context(InvalidTableSnafu {})?)
            }
            ChartKind::CasesTreemap => cases_treemap(view),
            ChartKind::CasesSunburst => cases_sunburst(view),
            ChartKind::AssetsViolin => assets_violin(view),
            ChartKind::GenderPie => {
                gender_pie(&value_counts(view, GENDER).context(InvalidTableSnafu {})?)
            }
            ChartKind::AgeHistogram => age_histogram(view),
            ChartKind::AssetsBox => assets_box(view),
            ChartKind::DistrictPartyHeatmap => district_party_heatmap(
                &pivot_counts(view, DISTRICT, PARTY).context(InvalidTableSnafu {})?,
            ),
            ChartKind::AgeAssetsScatter => age_assets_scatter(view),
            ChartKind::EducationSunburst => education_sunburst(view),
        }
    }
}

fn plot_figure(plot: &Plot) -> DashboardResult<ChartOutput> {
    let js: JSValue =
        serde_json::from_str(plot.to_json().as_str()).context(SerializingFigureSnafu {})?;
    Ok(ChartOutput::Figure(js))
}

fn figure(data: Vec<JSValue>, layout: JSValue) -> ChartOutput {
    ChartOutput::Figure(json!({ "data": data, "layout": layout }))
}

fn axis(title: &str) -> Axis {
    Axis::new().title(Title::with_text(title))
}

fn legend(title: &str) -> Legend {
    Legend::new().title(Title::with_text(title))
}

/// The "plotly_dark" template, for the figures written in JSON.
fn dark_template() -> DashboardResult<JSValue> {
    serde_json::to_value(BuiltinTheme::PlotlyDark.build()).context(SerializingFigureSnafu {})
}

/// The values of a numeric column for the given rows, None where there is no number.
fn numbers(view: &FilteredView, rows: &[usize], column: &str) -> DashboardResult<Vec<Option<f64>>> {
    let col = view
        .table()
        .column_index(column)
        .context(InvalidTableSnafu {})?;
    Ok(rows
        .iter()
        .map(|idx| view.table().row(*idx)[col].as_f64().filter(|f| f.is_finite()))
        .collect())
}

/// Bar chart of the number of candidates per party, one color per party.
pub fn party_bar(counts: &[(String, u64)]) -> DashboardResult<ChartOutput> {
    let mut plot = Plot::new();
    for (party, count) in counts.iter() {
        plot.add_trace(
            Bar::new(vec![party.clone()], vec![*count])
                .name(party.as_str())
                .legend_group(party.as_str())
                .text_array(vec![count.to_string()])
                .text_position(TextPosition::Auto),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Number of Candidates per Party"))
            .x_axis(axis(PARTY))
            .y_axis(axis("Number of Candidates"))
            .legend(legend(PARTY))
            .bar_mode(BarMode::Relative),
    );
    plot_figure(&plot)
}

fn hierarchy_trace(trace_type: &str, nodes: &[HierarchyNode], colored: bool) -> JSValue {
    let mut trace: JSMap<String, JSValue> = JSMap::new();
    trace.insert("type".to_string(), json!(trace_type));
    trace.insert(
        "ids".to_string(),
        json!(nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>()),
    );
    trace.insert(
        "labels".to_string(),
        json!(nodes.iter().map(|n| n.label.clone()).collect::<Vec<_>>()),
    );
    trace.insert(
        "parents".to_string(),
        json!(nodes.iter().map(|n| n.parent.clone()).collect::<Vec<_>>()),
    );
    trace.insert(
        "values".to_string(),
        json!(nodes.iter().map(|n| n.value).collect::<Vec<_>>()),
    );
    trace.insert("branchvalues".to_string(), json!("total"));
    if colored {
        trace.insert(
            "marker".to_string(),
            json!({
                "colors": nodes.iter().map(|n| n.color).collect::<Vec<_>>(),
                "coloraxis": "coloraxis",
            }),
        );
    }
    JSValue::Object(trace)
}

const REGION_PATH: [&str; 3] = [DISTRICT, CONSTITUENCY, CANDIDATE];

/// Treemap of the criminal cases, by district, constituency and candidate.
pub fn cases_treemap(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let nodes =
        hierarchy(view, &REGION_PATH, Some(CASES_TOTAL)).context(InvalidTableSnafu {})?;
    Ok(figure(
        vec![hierarchy_trace("treemap", &nodes, true)],
        json!({
            "title": { "text": "Treemap of Criminal Cases" },
            "template": dark_template()?,
            "coloraxis": { "colorbar": { "title": { "text": CASES_TOTAL } } },
        }),
    ))
}

/// Sunburst of the criminal cases, by district, constituency and candidate.
///
/// Only the candidates with at least one case are shown. If there are none, a notice is
/// returned instead of a figure.
pub fn cases_sunburst(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let with_cases = view
        .retain_by(CASES_TOTAL, |c| c.as_f64().map_or(false, |v| v > 0.0))
        .context(InvalidTableSnafu {})?;
    if with_cases.is_empty() {
        debug!("cases_sunburst: no candidate with cases");
        return Ok(ChartOutput::Notice(NO_CASES_NOTICE.to_string()));
    }
    let nodes = hierarchy(&with_cases, &REGION_PATH, Some(CASES_TOTAL))
        .context(InvalidTableSnafu {})?;
    Ok(figure(
        vec![hierarchy_trace("sunburst", &nodes, true)],
        json!({
            "template": dark_template()?,
            "coloraxis": {
                "colorscale": "Viridis",
                "colorbar": { "title": { "text": CASES_TOTAL } },
            },
        }),
    ))
}

/// Violin plot of the assets, by gender. All the columns are shown when hovering a point.
pub fn assets_violin(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let groups = group_rows(view, GENDER).context(InvalidTableSnafu {})?;
    let columns = view.table().columns();
    let hovertemplate: String = columns
        .iter()
        .enumerate()
        .map(|(idx, c)| format!("{}=%{{customdata[{}]}}", c, idx))
        .collect::<Vec<_>>()
        .join("<br>")
        + "<extra></extra>";

    let mut data: Vec<JSValue> = Vec::new();
    for (gender, rows) in groups.iter() {
        let customdata: Vec<JSValue> = rows
            .iter()
            .map(|idx| {
                JSValue::Array(view.table().row(*idx).iter().map(cell_to_json).collect())
            })
            .collect();
        data.push(json!({
            "type": "violin",
            "name": gender,
            "legendgroup": gender,
            "scalegroup": gender,
            "x": vec![gender; rows.len()],
            "y": numbers(view, rows, TOTAL_ASSETS)?,
            "box": { "visible": true },
            "meanline": { "visible": true },
            "points": "all",
            "customdata": customdata,
            "hovertemplate": hovertemplate,
        }));
    }
    Ok(figure(
        data,
        json!({
            "template": dark_template()?,
            "xaxis": { "title": { "text": GENDER } },
            "yaxis": { "title": { "text": TOTAL_ASSETS } },
            "legend": { "title": { "text": GENDER } },
            "violinmode": "overlay",
        }),
    ))
}

/// Pie chart of the genders.
pub fn gender_pie(counts: &[(String, u64)]) -> DashboardResult<ChartOutput> {
    let labels: Vec<String> = counts.iter().map(|p| p.0.clone()).collect();
    let values: Vec<u64> = counts.iter().map(|p| p.1).collect();
    let mut plot = Plot::new();
    plot.add_trace(Pie::new(values).labels(labels));
    plot.set_layout(Layout::new().title(Title::with_text("Candidate Gender Ratio")));
    plot_figure(&plot)
}

/// Histogram of the ages, stacked by gender.
///
/// The bins are shared by all the genders and there are always `AGE_BINS` of them.
pub fn age_histogram(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let ages: Vec<f64> = view
        .column(AGE)
        .context(InvalidTableSnafu {})?
        .iter()
        .filter_map(|c| c.as_f64())
        .collect();
    let bins = fixed_bins(&ages, AGE_BINS);
    let mut plot = Plot::new();
    for (gender, rows) in group_rows(view, GENDER)
        .context(InvalidTableSnafu {})?
        .iter()
    {
        let x: Vec<f64> = numbers(view, rows, AGE)?.into_iter().flatten().collect();
        let mut trace = Histogram::new(x)
            .name(gender.as_str())
            .legend_group(gender.as_str())
            .n_bins_x(AGE_BINS);
        if let Some(b) = &bins {
            trace = trace
                .auto_bin_x(false)
                .x_bins(HistogramBins::new(b.start, b.end, b.size));
        }
        plot.add_trace(trace);
    }
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Age Distribution"))
            .x_axis(axis(AGE))
            .y_axis(axis("count"))
            .legend(legend(GENDER))
            .bar_mode(BarMode::Relative),
    );
    plot_figure(&plot)
}

/// Box plot of the assets, by party.
pub fn assets_box(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let mut plot = Plot::new();
    for (party, rows) in group_rows(view, PARTY)
        .context(InvalidTableSnafu {})?
        .iter()
    {
        plot.add_trace(
            BoxPlot::new_xy(vec![party.clone(); rows.len()], numbers(view, rows, TOTAL_ASSETS)?)
                .name(party.as_str())
                .legend_group(party.as_str()),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Asset Comparison by Party"))
            .x_axis(axis(PARTY))
            .y_axis(axis(TOTAL_ASSETS))
            .box_mode(BoxMode::Overlay),
    );
    plot_figure(&plot)
}

/// Heatmap of the number of candidates, districts in rows and parties in columns.
pub fn district_party_heatmap(pivot: &PivotMatrix) -> DashboardResult<ChartOutput> {
    let mut plot = Plot::new();
    plot.add_trace(
        HeatMap::new(pivot.columns.clone(), pivot.rows.clone(), pivot.counts.clone())
            .color_scale(ColorScale::Palette(ColorScalePalette::Viridis)),
    );
    plot.set_layout(
        Layout::new().title(Title::with_text("Heatmap of Candidates by District and Party")),
    );
    plot_figure(&plot)
}

/// Scatter plot of the assets against the age, one color per party.
pub fn age_assets_scatter(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let mut plot = Plot::new();
    for (party, rows) in group_rows(view, PARTY)
        .context(InvalidTableSnafu {})?
        .iter()
    {
        plot.add_trace(
            Scatter::new(numbers(view, rows, AGE)?, numbers(view, rows, TOTAL_ASSETS)?)
                .mode(Mode::Markers)
                .name(party.as_str())
                .legend_group(party.as_str()),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Age vs Total Assets Colored by Party"))
            .x_axis(axis(AGE))
            .y_axis(axis(TOTAL_ASSETS))
            .legend(legend(PARTY)),
    );
    plot_figure(&plot)
}

/// Sunburst of the number of candidates by party, education and gender.
pub fn education_sunburst(view: &FilteredView) -> DashboardResult<ChartOutput> {
    let nodes = hierarchy(view, &[PARTY, EDUCATION, GENDER], None).context(InvalidTableSnafu {})?;
    Ok(figure(
        vec![hierarchy_trace("sunburst", &nodes, false)],
        json!({
            "title": { "text": "Party-Education-Gender Sunburst" },
            "template": dark_template()?,
        }),
    ))
}
