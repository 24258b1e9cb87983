use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cfb_pickem::{
    BowlSelection, Engine, EngineError, PickSelection, ResultEntry, SlateEntry, SubmitMode, UserId,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Engine errors mapped onto HTTP statuses. Per-item failures never reach
/// here; they ride back inside the report bodies.
struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::GameNotFound(_)
            | EngineError::BowlGameNotFound(_)
            | EngineError::UserNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    external_id: String,
    email: String,
    display_name: String,
}

#[derive(Deserialize)]
struct PickSubmitRequest {
    user_id: UserId,
    season: i32,
    week: u32,
    mode: SubmitMode,
    selections: Vec<PickSelection>,
}

#[derive(Deserialize)]
struct BowlSubmitRequest {
    user_id: UserId,
    season: i32,
    selections: Vec<BowlSelection>,
}

#[derive(Deserialize)]
struct ResultsRequest {
    entered_by: UserId,
    entries: Vec<ResultEntry>,
}

async fn login(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = engine
        .identity
        .get_or_create(&req.external_id, &req.email, &req.display_name)?;
    Ok(Json(user))
}

async fn sync_slate(
    State(engine): State<Arc<Engine>>,
    Path((season, week)): Path<(i32, u32)>,
    Json(entries): Json<Vec<SlateEntry>>,
) -> Result<impl IntoResponse, ApiError> {
    let report = engine.catalog.sync_slate(season, week, &entries)?;
    Ok(Json(report))
}

async fn get_slate(
    State(engine): State<Arc<Engine>>,
    Path((season, week)): Path<(i32, u32)>,
) -> impl IntoResponse {
    Json(engine.catalog.get_slate(season, week))
}

async fn sync_bowl_slate(
    State(engine): State<Arc<Engine>>,
    Path(season): Path<i32>,
    Json(entries): Json<Vec<SlateEntry>>,
) -> Result<impl IntoResponse, ApiError> {
    let report = engine.catalog.sync_bowl_slate(season, &entries)?;
    Ok(Json(report))
}

async fn get_bowl_slate(
    State(engine): State<Arc<Engine>>,
    Path(season): Path<i32>,
) -> impl IntoResponse {
    Json(engine.catalog.get_bowl_slate(season))
}

async fn enter_results(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<ResultsRequest>,
) -> impl IntoResponse {
    Json(engine.catalog.bulk_enter_results(&req.entries, req.entered_by))
}

async fn enter_bowl_results(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<ResultsRequest>,
) -> impl IntoResponse {
    Json(
        engine
            .catalog
            .bulk_enter_bowl_results(&req.entries, req.entered_by),
    )
}

async fn submit_picks(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<PickSubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = engine.picks.submit(
        req.user_id,
        req.season,
        req.week,
        &req.selections,
        req.mode,
    )?;
    Ok(Json(report))
}

async fn submit_bowl_picks(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<BowlSubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = engine
        .bowl_picks
        .submit(req.user_id, req.season, &req.selections)?;
    Ok(Json(report))
}

async fn weekly_standings(
    State(engine): State<Arc<Engine>>,
    Path((season, week)): Path<(i32, u32)>,
) -> impl IntoResponse {
    Json(engine.standings.weekly(season, week))
}

async fn season_standings(
    State(engine): State<Arc<Engine>>,
    Path(season): Path<i32>,
) -> impl IntoResponse {
    Json(engine.standings.season(season))
}

async fn bowl_standings(
    State(engine): State<Arc<Engine>>,
    Path(season): Path<i32>,
) -> impl IntoResponse {
    Json(engine.standings.bowl(season))
}

async fn user_history(
    State(engine): State<Arc<Engine>>,
    Path((user_id, season)): Path<(UserId, i32)>,
) -> impl IntoResponse {
    Json(engine.standings.user_history(user_id, season))
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let engine = Arc::new(Engine::in_memory());

    let app = Router::new()
        .route("/login", post(login))
        .route("/slates/:season/:week", post(sync_slate).get(get_slate))
        .route(
            "/bowl/slates/:season",
            post(sync_bowl_slate).get(get_bowl_slate),
        )
        .route("/results", post(enter_results))
        .route("/bowl/results", post(enter_bowl_results))
        .route("/picks", post(submit_picks))
        .route("/bowl/picks", post(submit_bowl_picks))
        .route("/standings/:season", get(season_standings))
        .route("/standings/:season/:week", get(weekly_standings))
        .route("/bowl/standings/:season", get(bowl_standings))
        .route("/users/:user_id/history/:season", get(user_history))
        .layer(TraceLayer::new_for_http())
        .with_state(engine);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    println!("Starting pick'em server at http://{}", bind_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();

    axum::serve(listener, app).await.unwrap();
}
