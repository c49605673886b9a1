use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use fest_booking::{BookingRecord, BookingReference};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/{reference}", get(get_booking))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<BookingRecord>, AppError> {
    let reference = BookingReference::new(reference);
    state
        .bookings
        .get(&reference)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", reference)))
}
