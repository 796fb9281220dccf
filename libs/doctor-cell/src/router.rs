use axum::{routing::get, Router};

use crate::handlers;

pub fn doctor_routes() -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/slots", get(handlers::get_doctor_slots))
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability))
}
