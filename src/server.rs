use crate::config::AppConfig;
use crate::html::{self, CatalogInfo, ViewPayload};
use crate::links::LinkTable;
use crate::types::City;
use crate::view::{self, DetailView, ViewError, ViewState};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub cities: Vec<City>,
    pub links: LinkTable,
    pub catalog: CatalogInfo,
    pub page: String,
    view_state: Mutex<ViewState>,
}

impl AppState {
    fn view_state(&self) -> MutexGuard<'_, ViewState> {
        self.view_state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Deserialize)]
pub struct ViewParams {
    metric: String,
}

#[derive(Deserialize)]
pub struct DescribeParams {
    city: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// View errors become inline JSON messages, never a dropped connection.
#[derive(Debug)]
pub struct ApiError(ViewError);

impl From<ViewError> for ApiError {
    fn from(e: ViewError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ViewError::InvalidMetric(_) | ViewError::UnknownCity(_) => StatusCode::BAD_REQUEST,
            ViewError::MissingLink(_) => StatusCode::NOT_FOUND,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub async fn start_server(config: AppConfig, cities: Vec<City>) -> Result<()> {
    let links = LinkTable::build(&config.links);
    let catalog = CatalogInfo::build(&config, &cities);
    let page = html::dashboard_page(&catalog)?;

    let state = Arc::new(AppState {
        cities,
        links,
        catalog,
        page,
        view_state: Mutex::new(ViewState::new()),
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    tracing::info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/view", get(view_handler))
        .route("/api/describe", get(describe_handler))
        .route("/api/clear", post(clear_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

async fn catalog_handler(State(state): State<Arc<AppState>>) -> Json<CatalogInfo> {
    Json(state.catalog.clone())
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<ViewPayload>, ApiError> {
    let mut view_state = state.view_state();
    let metric = view_state.select_metric(&params.metric)?;
    let (map, bars) = view::render(metric.key(), &state.cities)?;
    Ok(Json(ViewPayload { map, bars }))
}

async fn describe_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DescribeParams>,
) -> Result<Json<DetailView>, ApiError> {
    let mut view_state = state.view_state();
    if let Some(city) = &params.city {
        view_state.select_city(&state.cities, city)?;
    }
    let detail = view::describe(view_state.selected(), &state.cities, &state.links)?;
    Ok(Json(detail))
}

async fn clear_handler(State(state): State<Arc<AppState>>) -> Result<Json<DetailView>, ApiError> {
    let mut view_state = state.view_state();
    view_state.clear_city();
    let detail = view::describe(view_state.selected(), &state.cities, &state.links)?;
    Ok(Json(detail))
}
