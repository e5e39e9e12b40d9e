//! Serves the interactive dashboard.
//!
//! `GET /` returns the page, `POST /filter` applies a change of one filter widget and
//! returns the redrawn panels, `GET /summary` returns the summary of the current view.

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::sync::{Arc, Mutex};

use candidate_stats::Dimension;

use crate::dashboard::config_reader::PageSettings;
use crate::dashboard::page::{self, PageMode};
use crate::dashboard::*;

#[derive(Clone)]
struct ServerState {
    dashboard: Arc<Mutex<Dashboard<'static>>>,
    page: Arc<PageSettings>,
}

/// The body of `POST /filter`: the new values of one filter widget.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct FilterRequest {
    pub dimension: String,
    pub values: Vec<String>,
}

/// The answer to a filter change. The panels are only sent when the selection changed.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct PanelsUpdate {
    pub changed: bool,
    pub selected: usize,
    pub total: usize,
    pub panels: Vec<JSValue>,
}

/// Turns a widget change into a `FilterChange` and passes it to the dashboard.
pub fn handle_filter(
    dashboard: &mut Dashboard,
    request: &FilterRequest,
) -> DashboardResult<PanelsUpdate> {
    let dimension = match Dimension::from_name(&request.dimension) {
        Some(d) => d,
        None => {
            return UnknownDimensionSnafu {
                dimension: request.dimension.clone(),
            }
            .fail()
        }
    };
    let change = FilterChange {
        dimension,
        values: request.values.clone(),
    };
    let changed = dashboard.on_filter_change(&change)?;
    Ok(PanelsUpdate {
        changed,
        selected: dashboard.num_selected(),
        total: dashboard.table().num_rows(),
        panels: if changed {
            page::panels_js(dashboard)
        } else {
            Vec::new()
        },
    })
}

type HandlerError = (StatusCode, String);

fn error_response(e: DashboardError) -> HandlerError {
    warn!("server: {}", e);
    let status = match e {
        DashboardError::UnknownDimension { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn poisoned() -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "The dashboard state is unavailable".to_string(),
    )
}

async fn index(State(state): State<ServerState>) -> Result<Html<String>, HandlerError> {
    let dashboard = state.dashboard.lock().map_err(|_| poisoned())?;
    Ok(Html(page::render_page(
        &state.page,
        &dashboard,
        PageMode::Interactive,
    )))
}

async fn filter(
    State(state): State<ServerState>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<PanelsUpdate>, HandlerError> {
    debug!("filter: {:?}", request);
    let mut dashboard = state.dashboard.lock().map_err(|_| poisoned())?;
    let update = handle_filter(&mut dashboard, &request).map_err(error_response)?;
    Ok(Json(update))
}

async fn summary(State(state): State<ServerState>) -> Result<Json<JSValue>, HandlerError> {
    let dashboard = state.dashboard.lock().map_err(|_| poisoned())?;
    let js = dashboard.summary_js().map_err(error_response)?;
    Ok(Json(js))
}

pub fn router(dashboard: Dashboard<'static>, page: PageSettings) -> Router {
    let state = ServerState {
        dashboard: Arc::new(Mutex::new(dashboard)),
        page: Arc::new(page),
    };
    Router::new()
        .route("/", get(index))
        .route("/filter", post(filter))
        .route("/summary", get(summary))
        .with_state(state)
}

/// Serves the dashboard until the process is stopped.
pub async fn serve(
    dashboard: Dashboard<'static>,
    page: PageSettings,
    addr: &str,
) -> DashboardResult<()> {
    let app = router(dashboard, page);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(BindingSnafu { addr })?;
    info!("Serving the dashboard on http://{}/", addr);
    axum::serve(listener, app).await.context(ServingSnafu {})
}
