use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fest_booking::{ExportFormat, QrPayload};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ExportRequest {
    #[serde(default = "default_format")]
    format: ExportFormat,
}

fn default_format() -> ExportFormat {
    ExportFormat::Svg
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    file_name: String,
    path: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flow/cards/{index}", get(print_card))
        .route("/v1/flow/cards/{index}/qr", get(qr_payload))
        .route("/v1/flow/cards/{index}/export", post(export_card))
}

// Print view
async fn print_card(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, AppError> {
    let card = state.session.card(index).await?;
    let svg = card
        .render_svg()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, ExportFormat::Svg.content_type())], svg))
}

async fn qr_payload(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<QrPayload>, AppError> {
    let card = state.session.card(index).await?;
    Ok(Json(card.qr_payload()))
}

async fn export_card(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    let card = state.session.card(index).await?;
    let path = state.exporter.export(&card, req.format).await?;

    Ok(Json(ExportResponse {
        file_name: card.file_name(req.format),
        path: path.display().to_string(),
    }))
}
