use log::{debug, info};
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::args::Args;
use crate::dashboard::*;

pub const DEFAULT_TITLE: &str = "Delhi Assembly 2025 Candidate Dashboard";
pub const DEFAULT_DESCRIPTION: &str =
    "Visualizing insights from the candidate dataset: Criminal cases, assets, gender, education & more.";
pub const DEFAULT_INPUT_PATH: &str = "data/Delhi Assembly 2025 Candidates Data.xls";
pub const DEFAULT_OUTPUT_PATH: &str = "dashboard.html";
pub const DEFAULT_SERVE_ADDRESS: &str = "127.0.0.1:8501";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    /// Serves the interactive dashboard on this address.
    #[serde(rename = "serveAddress")]
    pub serve_address: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceSettings {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    pub party: Option<Vec<String>>,
    pub gender: Option<Vec<String>>,
    pub district: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource", default)]
    pub data_source: DataSourceSettings,
    #[serde(default)]
    pub filters: FilterSettings,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Excel,
    Csv,
}

impl InputType {
    fn parse(s: &str) -> DashboardResult<InputType> {
        match s {
            "excel" | "xlsx" | "xls" => Ok(InputType::Excel),
            "csv" => Ok(InputType::Csv),
            x => UnknownInputTypeSnafu { input_type: x }.fail(),
        }
    }

    /// Spreadsheets are the default, unless the file is clearly a CSV file.
    fn from_path(path: &str) -> InputType {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputType::Csv,
            _ => InputType::Excel,
        }
    }
}

/// Where and how to read the candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DataSource {
    pub input_type: InputType,
    pub path: String,
    pub worksheet_name: Option<String>,
}

/// Options that control the shape of the dashboard page.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PageSettings {
    pub title: String,
    pub description: String,
}

/// The settings after merging the command line, the configuration file and the defaults.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub page: PageSettings,
    pub data: DataSource,
    /// Where to write the static page. None when only serving.
    pub output_path: Option<String>,
    pub serve_address: Option<String>,
    pub summary_path: Option<String>,
    pub reference_path: Option<String>,
    pub filters: Vec<FilterChange>,
}

pub fn read_config(path: &str) -> DashboardResult<DashboardConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);
    Ok(config)
}

/// Merges the command line arguments with an optional configuration file.
///
/// The command line takes precedence. A relative path to the data in the configuration file
/// is read from the directory of the configuration file.
pub fn resolve_settings(
    args: &Args,
    config: Option<(&str, DashboardConfig)>,
) -> DashboardResult<Settings> {
    let (config_dir, config): (Option<PathBuf>, DashboardConfig) = match config {
        Some((config_path, c)) => {
            let dir = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?;
            (Some(dir.to_path_buf()), c)
        }
        None => (None, DashboardConfig::default()),
    };

    let path: String = match (&args.input, &config.data_source.file_path, &config_dir) {
        (Some(p), _, _) => p.clone(),
        (None, Some(p), Some(dir)) => {
            let joined: PathBuf = [dir.as_path(), Path::new(p)].iter().collect();
            joined.display().to_string()
        }
        (None, Some(p), None) => p.clone(),
        (None, None, _) => DEFAULT_INPUT_PATH.to_string(),
    };

    let input_type = match args
        .input_type
        .as_ref()
        .or(config.data_source.provider.as_ref())
    {
        Some(s) => InputType::parse(s)?,
        None => InputType::from_path(&path),
    };

    let worksheet_name = args
        .excel_worksheet_name
        .clone()
        .or(config.data_source.excel_worksheet_name);

    let mut filters: Vec<FilterChange> = Vec::new();
    for (dimension, from_args, from_config) in [
        (Dimension::Party, &args.party, config.filters.party),
        (Dimension::Gender, &args.gender, config.filters.gender),
        (Dimension::District, &args.district, config.filters.district),
    ] {
        if let Some(values) = from_args.clone().or(from_config) {
            filters.push(FilterChange { dimension, values });
        }
    }

    let out = config.output_settings;
    let serve_address = args.serve.clone().or(out.serve_address);
    let output_path = match (args.out.clone().or(out.output_path), &serve_address) {
        (Some(p), _) => Some(p),
        (None, Some(_)) => None,
        (None, None) => Some(DEFAULT_OUTPUT_PATH.to_string()),
    };
    Ok(Settings {
        page: PageSettings {
            title: out.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: out
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        },
        data: DataSource {
            input_type,
            path,
            worksheet_name,
        },
        output_path,
        serve_address,
        summary_path: args.summary.clone().or(out.summary_path),
        reference_path: args.reference.clone(),
        filters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let settings = resolve_settings(&Args::default(), None).unwrap();
        assert_eq!(settings.data.path, DEFAULT_INPUT_PATH);
        assert_eq!(settings.data.input_type, InputType::Excel);
        assert_eq!(settings.output_path, Some(DEFAULT_OUTPUT_PATH.to_string()));
        assert_eq!(settings.serve_address, None);
        assert_eq!(settings.page.title, DEFAULT_TITLE);
        assert!(settings.filters.is_empty());
        assert_eq!(settings.summary_path, None);
    }

    #[test]
    fn parse_config() {
        let js = r#"{
            "outputSettings": {"title": "Test board", "summaryPath": "summary.json"},
            "dataSource": {"filePath": "candidates.csv"},
            "filters": {"party": ["AAP"], "district": []}
        }"#;
        let config: DashboardConfig = serde_json::from_str(js).unwrap();
        let settings = resolve_settings(&Args::default(), Some(("conf/board.json", config))).unwrap();
        assert_eq!(settings.page.title, "Test board");
        assert_eq!(settings.page.description, DEFAULT_DESCRIPTION);
        assert_eq!(settings.data.path, "conf/candidates.csv");
        assert_eq!(settings.data.input_type, InputType::Csv);
        assert_eq!(settings.summary_path, Some("summary.json".to_string()));
        assert_eq!(
            settings.filters,
            vec![
                FilterChange {
                    dimension: Dimension::Party,
                    values: s(&["AAP"])
                },
                FilterChange {
                    dimension: Dimension::District,
                    values: vec![]
                },
            ]
        );
    }

    #[test]
    fn arguments_take_precedence() {
        let js = r#"{"dataSource": {"filePath": "a.csv", "provider": "csv"}, "filters": {"party": ["AAP"]}}"#;
        let config: DashboardConfig = serde_json::from_str(js).unwrap();
        let args = Args {
            input: Some("b.xlsx".to_string()),
            input_type: Some("excel".to_string()),
            party: Some(s(&["BJP", "INC"])),
            out: Some("stdout".to_string()),
            ..Args::default()
        };
        let settings = resolve_settings(&args, Some(("board.json", config))).unwrap();
        assert_eq!(settings.data.path, "b.xlsx");
        assert_eq!(settings.data.input_type, InputType::Excel);
        assert_eq!(settings.output_path, Some("stdout".to_string()));
        assert_eq!(settings.filters[0].values, s(&["BJP", "INC"]));
    }

    #[test]
    fn serving_skips_the_default_page() {
        let args = Args {
            serve: Some(DEFAULT_SERVE_ADDRESS.to_string()),
            ..Args::default()
        };
        let settings = resolve_settings(&args, None).unwrap();
        assert_eq!(settings.serve_address, Some(DEFAULT_SERVE_ADDRESS.to_string()));
        assert_eq!(settings.output_path, None);

        let js = r#"{"outputSettings": {"serveAddress": "0.0.0.0:9000", "outputPath": "board.html"}}"#;
        let config: DashboardConfig = serde_json::from_str(js).unwrap();
        let settings = resolve_settings(&Args::default(), Some(("board.json", config))).unwrap();
        assert_eq!(settings.serve_address, Some("0.0.0.0:9000".to_string()));
        assert_eq!(settings.output_path, Some("board.html".to_string()));
    }

    #[test]
    fn unknown_provider() {
        let args = Args {
            input_type: Some("parquet".to_string()),
            ..Args::default()
        };
        let res = resolve_settings(&args, None);
        assert!(matches!(res, Err(DashboardError::UnknownInputType { .. })));
    }

    #[test]
    fn missing_config_file() {
        let res = read_config("/nonexistent/board.json");
        assert!(matches!(res, Err(DashboardError::OpeningJson { .. })));
    }
}
