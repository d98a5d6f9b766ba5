use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::{
    Completion, EconomicConstants, Field, FieldDomain, KpiSet, MonthRecord, ParameterPatch,
    ParameterSet, Preset, ProjectionResult, Session, run_projection, steady_state_users,
};
use crate::report::{
    ChartPoint, DisplayWindow, ProfitCard, ProfitView, TableTotals, chart_series, csv_content,
    export_filename_today, format_slider_value, profit_cards, table_totals,
};

mod cli;

pub use cli::{
    Cli, CliProfitView, Command, ConstantsArgs, ProjectArgs, build_constants, print_presets,
    run_project,
};

pub struct AppState {
    constants: EconomicConstants,
    session: Mutex<Session>,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(constants: EconomicConstants) -> Result<Self, String> {
        let session =
            Session::new(constants, Preset::DEFAULT.params()).map_err(|e| e.to_string())?;
        Ok(Self {
            constants,
            session: Mutex::new(session),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct ApiOptions {
    pub(crate) window: DisplayWindow,
    pub(crate) view: ProfitView,
}

#[derive(Debug)]
struct ApiRequest {
    preset: Option<Preset>,
    patch: ParameterPatch,
    options: ApiOptions,
}

impl ApiRequest {
    fn params_over(&self, current: &ParameterSet) -> ParameterSet {
        let base = self.preset.map(Preset::params).unwrap_or(*current);
        self.patch.apply_to(&base)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    preset: Option<Preset>,

    monthly_spend: Option<f64>,
    #[serde(rename = "baseCPL", alias = "baseCpl")]
    base_cpl: Option<f64>,
    conversion_rate: Option<f64>,
    cpl_penalty: Option<f64>,
    usage_days: Option<u32>,
    price_per_day: Option<f64>,
    retention: Option<f64>,

    months: Option<u32>,
    view: Option<ProfitView>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportQuery {
    months: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaybackLabels {
    digital: String,
    all_in: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectionResponse {
    params: ParameterSet,
    constants: EconomicConstants,
    monthly_arpu: f64,
    steady_state_users: Option<f64>,
    projection: ProjectionResult,
    display_window: DisplayWindow,
    display_months: Vec<MonthRecord>,
    totals: TableTotals,
    chart: Vec<ChartPoint>,
    profit_view: ProfitView,
    profit_cards: Vec<ProfitCard>,
    payback: PaybackLabels,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    revision: u64,
    last_error: Option<String>,
    #[serde(flatten)]
    view: ProjectionResponse,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct RejectedResponse {
    error: String,
    current: SessionResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldResponse {
    key: &'static str,
    #[serde(flatten)]
    domain: FieldDomain,
    min_label: String,
    max_label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetResponse {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    params: ParameterSet,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/presets", get(presets_handler))
        .route("/api/fields", get(fields_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/session",
            get(session_get_handler).post(session_post_handler),
        )
        .route("/api/export.csv", get(export_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, constants: EconomicConstants) -> std::io::Result<()> {
    let state = AppState::new(constants)
        .map_err(|msg| std::io::Error::new(std::io::ErrorKind::InvalidInput, msg))?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "growth simulator HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/session");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn presets_handler() -> Response {
    let presets = Preset::ALL
        .into_iter()
        .map(|preset| PresetResponse {
            key: preset.key(),
            name: preset.name(),
            description: preset.description(),
            params: preset.params(),
        })
        .collect::<Vec<_>>();
    json_response(StatusCode::OK, presets)
}

async fn fields_handler() -> Response {
    let fields = Field::ALL
        .into_iter()
        .map(|field| {
            let domain = field.domain();
            FieldResponse {
                key: field.key(),
                min_label: format_slider_value(domain.min, domain.format),
                max_label: format_slider_value(domain.max, domain.format),
                domain,
            }
        })
        .collect::<Vec<_>>();
    json_response(StatusCode::OK, fields)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    State(state): State<SharedState>,
    payload: Result<Query<ProjectPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(&state, payload),
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn project_post_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(&state, payload),
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

fn project_handler_impl(state: &AppState, payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let params = request.params_over(&Preset::DEFAULT.params());
    match run_projection(&params, &state.constants) {
        Ok(result) => json_response(
            StatusCode::OK,
            build_projection_response(&params, &state.constants, result, request.options),
        ),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn session_get_handler(
    State(state): State<SharedState>,
    payload: Result<Query<ProjectPayload>, QueryRejection>,
) -> Response {
    let payload = match payload {
        Ok(Query(payload)) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let session = match lock_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    json_response(
        StatusCode::OK,
        build_session_response(&session, request.options),
    )
}

async fn session_post_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return session_rejected_response(&state, &rejection.body_text()),
    };
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return session_rejected_response(&state, &msg),
    };

    // Evaluate outside the lock; only the newest submission gets published.
    let submission = {
        let mut session = match lock_session(&state) {
            Ok(session) => session,
            Err(response) => return response,
        };
        let params = request.params_over(session.params());
        session.submit(params)
    };
    let outcome = submission.evaluate(&state.constants);

    let mut session = match lock_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.complete(submission, outcome) {
        Completion::Rejected(err) => json_response(
            StatusCode::BAD_REQUEST,
            RejectedResponse {
                error: err.to_string(),
                current: build_session_response(&session, request.options),
            },
        ),
        Completion::Published | Completion::Stale { .. } => json_response(
            StatusCode::OK,
            build_session_response(&session, request.options),
        ),
    }
}

/// 400 carrying the untouched session view, for updates that never reached the engine.
fn session_rejected_response(state: &AppState, msg: &str) -> Response {
    let session = match lock_session(state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let options = ApiOptions {
        window: DisplayWindow::default(),
        view: ProfitView::default(),
    };
    json_response(
        StatusCode::BAD_REQUEST,
        RejectedResponse {
            error: msg.to_string(),
            current: build_session_response(&session, options),
        },
    )
}

async fn export_handler(
    State(state): State<SharedState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let window = match display_window(query.months) {
        Ok(window) => window,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let session = match lock_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let body = csv_content(window.rows(session.result()));
    let disposition = format!("attachment; filename=\"{}\"", export_filename_today());

    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

fn lock_session(state: &AppState) -> Result<MutexGuard<'_, Session>, Response> {
    state.session.lock().map_err(|_| {
        error!("session lock poisoned");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Session state unavailable")
    })
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn display_window(months: Option<u32>) -> Result<DisplayWindow, String> {
    match months {
        None => Ok(DisplayWindow::default()),
        Some(m) => DisplayWindow::from_months(m)
            .ok_or_else(|| format!("months must be 3 or 12, got {m}")),
    }
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let options = ApiOptions {
        window: display_window(payload.months)?,
        view: payload.view.unwrap_or_default(),
    };
    let patch = ParameterPatch {
        monthly_spend: payload.monthly_spend,
        base_cpl: payload.base_cpl,
        conversion_rate: payload.conversion_rate,
        cpl_penalty: payload.cpl_penalty,
        usage_days: payload.usage_days,
        price_per_day: payload.price_per_day,
        retention: payload.retention,
    };

    Ok(ApiRequest {
        preset: payload.preset,
        patch,
        options,
    })
}

fn payback_labels(kpis: &KpiSet) -> PaybackLabels {
    PaybackLabels {
        digital: kpis.digital_payback.to_string(),
        all_in: kpis.all_in_payback.to_string(),
    }
}

pub(crate) fn build_projection_response(
    params: &ParameterSet,
    constants: &EconomicConstants,
    projection: ProjectionResult,
    options: ApiOptions,
) -> ProjectionResponse {
    let display_months = options.window.rows(&projection).to_vec();
    ProjectionResponse {
        params: *params,
        constants: *constants,
        monthly_arpu: params.monthly_arpu(),
        steady_state_users: steady_state_users(params, constants).ok(),
        display_window: options.window,
        totals: table_totals(&display_months),
        display_months,
        chart: chart_series(&projection),
        profit_view: options.view,
        profit_cards: profit_cards(&projection.kpis, options.view),
        payback: payback_labels(&projection.kpis),
        projection,
    }
}

fn build_session_response(session: &Session, options: ApiOptions) -> SessionResponse {
    SessionResponse {
        revision: session.revision(),
        last_error: session.last_error().map(ToString::to_string),
        view: build_projection_response(
            session.params(),
            session.constants(),
            session.result().clone(),
            options,
        ),
    }
}
