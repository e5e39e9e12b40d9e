//! The dashboard page.
//!
//! A single self-contained HTML document: title, filter widgets, the ten chart panels and
//! a footer. The panels are embedded as JSON and drawn by plotly.js. When the page is
//! served, changing a widget posts the new selection and redraws the panels it gets back.

use candidate_stats::*;
use serde_json::json;
use serde_json::Value as JSValue;

use crate::dashboard::charts::ChartOutput;
use crate::dashboard::config_reader::PageSettings;
use crate::dashboard::*;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const CSS: &str = r#"
body { font-family: "Source Sans Pro", sans-serif; margin: 0; display: flex; color: #262730; }
aside { width: 280px; min-height: 100vh; padding: 1.5rem; background: #f0f2f6; box-sizing: border-box; }
aside label { display: block; margin-top: 1rem; font-weight: 600; }
aside select { width: 100%; margin-top: 0.3rem; }
main { flex: 1; padding: 1.5rem 3rem; min-width: 0; }
.panel { margin-bottom: 2rem; }
.chart { width: 100%; min-height: 450px; }
.notice { min-height: 0; padding: 1rem; border-radius: 0.5rem; }
.warning { background: #fffce7; color: #926c05; }
.error { background: #ffecec; color: #7d353b; }
.hint { font-size: 0.85rem; color: #6b6f76; }
"#;

// Draws the panels, and in interactive mode sends the widget changes to the server.
const SCRIPT: &str = r#"
function drawPanel(idx, panel) {
    var div = document.getElementById("panel-" + idx);
    if (panel.figure) {
        div.className = "chart";
        div.textContent = "";
        Plotly.react(div, panel.figure.data, panel.figure.layout, {responsive: true});
    } else {
        Plotly.purge(div);
        div.className = "notice " + (panel.notice ? "warning" : "error");
        div.textContent = panel.notice || panel.error;
    }
}
PANELS.forEach(function (panel, i) { drawPanel(i + 1, panel); });
if (INTERACTIVE) {
    document.querySelectorAll("select[data-dimension]").forEach(function (select) {
        select.addEventListener("change", function () {
            var values = Array.from(select.selectedOptions).map(function (o) { return o.value; });
            fetch("filter", {
                method: "POST",
                headers: {"Content-Type": "application/json"},
                body: JSON.stringify({dimension: select.dataset.dimension, values: values})
            }).then(function (resp) {
                if (!resp.ok) { return resp.text().then(function (t) { throw new Error(t); }); }
                return resp.json();
            }).then(function (update) {
                document.getElementById("selection-status").textContent =
                    update.selected + " of " + update.total + " candidates selected.";
                if (update.changed) {
                    update.panels.forEach(function (panel, i) { drawPanel(i + 1, panel); });
                }
            }).catch(function (err) {
                document.getElementById("selection-status").textContent = "Update failed: " + err.message;
            });
        });
    });
}
"#;

/// How the page is delivered.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PageMode {
    /// Written to a file. The widgets only show the selection.
    Static,
    /// Served by `candash --serve`. The widgets change the selection.
    Interactive,
}

/// Escapes text for the content of HTML elements and attributes.
pub fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON that can be placed in a script element.
fn script_json(js: &JSValue) -> String {
    js.to_string().replace("</", "<\\/")
}

/// The content of a panel, as drawn by the page script.
pub fn panel_js(panel: &Panel) -> JSValue {
    match &panel.content {
        PanelContent::Chart(ChartOutput::Figure(fig)) => json!({ "figure": fig }),
        PanelContent::Chart(ChartOutput::Notice(msg)) => json!({ "notice": msg }),
        PanelContent::Failed(msg) => json!({ "error": msg }),
    }
}

pub fn panels_js(dashboard: &Dashboard) -> Vec<JSValue> {
    dashboard.panels().iter().map(panel_js).collect()
}

fn render_sidebar(options: &FilterOptions, selection: &Selection, mode: PageMode) -> String {
    let mut out = String::from("<aside><h2>Filter Options</h2>");
    for dim in Dimension::ALL {
        let selected = selection.get(dim);
        out.push_str(&format!(
            "<label for=\"filter-{id}\">{label}</label>\
             <select id=\"filter-{id}\" data-dimension=\"{column}\" multiple size=\"6\"{disabled}>",
            id = dim.column().to_lowercase(),
            column = esc(dim.column()),
            label = esc(dim.label()),
            disabled = if mode == PageMode::Static { " disabled" } else { "" },
        ));
        for value in options.get(dim) {
            let shown = if value.is_empty() { BLANK_LABEL } else { value.as_str() };
            out.push_str(&format!(
                "<option value=\"{v}\"{sel}>{shown}</option>",
                v = esc(value),
                sel = if selected.contains(value) { " selected" } else { "" },
                shown = esc(shown),
            ));
        }
        out.push_str("</select>");
    }
    if mode == PageMode::Static {
        out.push_str(
            "<p class=\"hint\">Start candash with --serve to change the selection.</p>",
        );
    }
    out.push_str("</aside>");
    out
}

fn render_panel(idx: usize, panel: &Panel) -> String {
    format!(
        "<section class=\"panel\"><h3>{}</h3><div id=\"panel-{}\" class=\"chart\"></div></section>",
        esc(panel.kind.subheader()),
        idx
    )
}

/// Renders the whole page for the current state of the dashboard.
pub fn render_page(settings: &PageSettings, dashboard: &Dashboard, mode: PageMode) -> String {
    let panels: String = dashboard
        .panels()
        .iter()
        .enumerate()
        .map(|(idx, p)| render_panel(idx + 1, p))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
    <script src="{plotly}" charset="utf-8"></script>
</head>
<body>
    {sidebar}
    <main>
        <h1>🗳️ {title}</h1>
        <p>{description}</p>
        <p class="hint" id="selection-status">{shown} of {total} candidates selected.</p>
        {panels}
        <hr>
        <p>Powered by Plotly</p>
    </main>
    <script>
    var PANELS = {panels_js};
    var INTERACTIVE = {interactive};
    {script}
    </script>
</body>
</html>"#,
        title = esc(&settings.title),
        css = CSS,
        plotly = PLOTLY_JS,
        sidebar = render_sidebar(dashboard.options(), dashboard.selection(), mode),
        description = esc(&settings.description),
        shown = dashboard.num_selected(),
        total = dashboard.table().num_rows(),
        panels = panels,
        panels_js = script_json(&JSValue::Array(panels_js(dashboard))),
        interactive = mode == PageMode::Interactive,
        script = SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::charts::tests::candidates;
    use crate::dashboard::charts::{ChartKind, NO_CASES_NOTICE};
    use crate::dashboard::config_reader::{DEFAULT_DESCRIPTION, DEFAULT_TITLE};

    fn settings() -> PageSettings {
        PageSettings {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    #[test]
    fn escapes() {
        assert_eq!(esc("<b>\"R&D\"</b>"), "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt;");
        assert_eq!(script_json(&json!("</script>")), "\"<\\/script>\"");
    }

    #[test]
    fn page_has_all_panels() {
        let t = candidates();
        let dashboard = Dashboard::new(&t).unwrap();
        let html = render_page(&settings(), &dashboard, PageMode::Static);
        assert!(html.contains(DEFAULT_TITLE));
        assert_eq!(html.matches("<section class=\"panel\">").count(), 10);
        assert!(html.contains("<div id=\"panel-10\" class=\"chart\">"));
        assert!(html.contains("<option value=\"AAP\" selected>AAP</option>"));
        assert!(html.contains("5 of 5 candidates selected."));
        assert!(html.contains("var INTERACTIVE = false;"));
        assert_eq!(html.matches(" disabled>").count(), 3);

        let panels = panels_js(&dashboard);
        assert_eq!(panels.len(), 10);
        assert!(panels.iter().all(|p| p.get("figure").is_some()));
    }

    #[test]
    fn page_shows_notice() {
        let t = candidates();
        let mut dashboard = Dashboard::new(&t).unwrap();
        dashboard
            .on_filter_change(&FilterChange {
                dimension: Dimension::Party,
                values: vec!["AAP".to_string()],
            })
            .unwrap();
        let panels = panels_js(&dashboard);
        assert_eq!(panels.iter().filter(|p| p.get("figure").is_some()).count(), 9);
        assert_eq!(panels[2], json!({ "notice": NO_CASES_NOTICE }));

        let html = render_page(&settings(), &dashboard, PageMode::Static);
        assert!(html.contains(NO_CASES_NOTICE));
        assert!(html.contains("<option value=\"BJP\">BJP</option>"));
        assert!(html.contains("2 of 5 candidates selected."));
    }

    #[test]
    fn failed_panels_carry_their_message() {
        let panel = Panel {
            kind: ChartKind::AgeHistogram,
            content: PanelContent::Failed("no Age".to_string()),
        };
        assert_eq!(panel_js(&panel), json!({ "error": "no Age" }));
    }

    #[test]
    fn interactive_page_posts_changes() {
        let t = candidates();
        let dashboard = Dashboard::new(&t).unwrap();
        let html = render_page(&settings(), &dashboard, PageMode::Interactive);
        assert!(!html.contains("disabled"));
        assert!(!html.contains("--serve"));
        assert!(html.contains("var INTERACTIVE = true;"));
        assert!(html.contains("fetch(\"filter\""));
        assert!(html.contains("data-dimension=\"Party\""));
    }
}
