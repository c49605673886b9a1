use fest_core::{BookingRepository, CardExporter};
use std::sync::Arc;

use crate::session::SessionHandle;

#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub bookings: Arc<dyn BookingRepository>,
    pub exporter: Arc<dyn CardExporter>,
}
