pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::appointment_routes;

pub mod api {
    pub use crate::services::booking::AppointmentBookingService;
    pub use crate::services::conflict::ConflictDetectionService;
    pub use crate::services::store::{spawn_sync_listener, AppointmentRepository};
}
