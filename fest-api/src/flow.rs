use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use fest_booking::{AttendeeField, FlowEvent, FlowView, TicketSelection};
use fest_catalog::{TicketCount, TicketTier, TierInfo};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SelectionRequest {
    tier: String,
    count: i64,
}

#[derive(Debug, Deserialize)]
struct CountRequest {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct AvatarQuery {
    file_name: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tiers", get(list_tiers))
        .route("/v1/flow", get(current_flow))
        .route("/v1/flow/selection", post(select_tickets))
        .route("/v1/flow/count", put(change_count))
        .route("/v1/flow/attendees/{index}", patch(edit_attendee))
        .route("/v1/flow/attendees/{index}/avatar", post(upload_avatar))
        .route("/v1/flow/submit", post(submit))
        .route("/v1/flow/back", post(back))
        .route("/v1/flow/new", post(new_booking))
        .route("/v1/flow/notices", get(notices))
}

async fn list_tiers() -> Json<Vec<TierInfo>> {
    Json(TicketTier::catalogue())
}

async fn current_flow(State(state): State<AppState>) -> Result<Json<FlowView>, AppError> {
    Ok(Json(state.session.view().await?))
}

async fn select_tickets(
    State(state): State<AppState>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<FlowView>, AppError> {
    let tier: TicketTier = req.tier.parse().map_err(|e: fest_catalog::CatalogError| AppError::BadRequest(e.to_string()))?;
    let count = TicketCount::new(req.count).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let view = state
        .session
        .apply(FlowEvent::Select(TicketSelection { tier, count }))
        .await?;
    Ok(Json(view))
}

async fn change_count(
    State(state): State<AppState>,
    Json(req): Json<CountRequest>,
) -> Result<Json<FlowView>, AppError> {
    let count = TicketCount::new(req.count).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(state.session.apply(FlowEvent::ChangeCount(count)).await?))
}

/// Body is a map of field name to new value, e.g. `{"fullName": "Ada"}`,
/// applied as one change. Field errors are reported in the returned view
/// rather than as a failure.
async fn edit_attendee(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(changes): Json<BTreeMap<AttendeeField, String>>,
) -> Result<Json<FlowView>, AppError> {
    if changes.is_empty() {
        return Err(AppError::BadRequest("No attendee fields given".to_string()));
    }

    let view = state
        .session
        .apply(FlowEvent::EditFields { index, changes })
        .await?;
    Ok(Json(view))
}

async fn upload_avatar(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Query(query): Query<AvatarQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<FlowView>), AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Image payload is empty".to_string()));
    }

    let file_name = query.file_name.unwrap_or_else(|| format!("attendee-{}", index + 1));
    info!("Avatar upload requested for attendee {} ({} bytes)", index, body.len());

    let view = state.session.start_upload(index, body.to_vec(), file_name).await?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

async fn submit(State(state): State<AppState>) -> Result<Json<FlowView>, AppError> {
    let view = state.session.apply(FlowEvent::Submit { at: Utc::now() }).await?;
    Ok(Json(view))
}

async fn back(State(state): State<AppState>) -> Result<Json<FlowView>, AppError> {
    Ok(Json(state.session.apply(FlowEvent::Back).await?))
}

async fn new_booking(State(state): State<AppState>) -> Result<Json<FlowView>, AppError> {
    Ok(Json(state.session.apply(FlowEvent::NewBooking).await?))
}

async fn notices(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.session.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(notice) => match Event::default().event(notice.kind()).json_data(&notice) {
                Ok(event) => Some(Ok::<_, Infallible>(event)),
                Err(e) => {
                    warn!("Could not encode {} notice: {}", notice.kind(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Notice subscriber fell behind: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
