use axum::{
    extract::{Path, Query},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{Doctor, SlotListing, SlotQuery};
use crate::services::{find_doctor, generate_time_slots, mock_available_slots, DOCTORS};

fn require_doctor(doctor_id: &str) -> Result<&'static Doctor, AppError> {
    find_doctor(doctor_id)
        .ok_or_else(|| AppError::NotFound(format!("Doctor {} not found", doctor_id)))
}

pub async fn list_doctors() -> Json<Value> {
    Json(json!({
        "doctors": DOCTORS,
        "total": DOCTORS.len()
    }))
}

pub async fn get_doctor(Path(doctor_id): Path<String>) -> Result<Json<Doctor>, AppError> {
    let doctor = require_doctor(&doctor_id)?;
    Ok(Json(*doctor))
}

/// Every slot inside working hours, regardless of bookings.
pub async fn get_doctor_slots(
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotListing>, AppError> {
    let doctor = require_doctor(&doctor_id)?;
    let slots = generate_time_slots(query.date);

    Ok(Json(SlotListing {
        doctor_id: doctor.id.to_string(),
        date: query.date,
        total_slots: slots.len(),
        slots,
        simulated: false,
    }))
}

pub async fn get_doctor_availability(
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotListing>, AppError> {
    let doctor = require_doctor(&doctor_id)?;
    let slots = mock_available_slots(query.date, &mut rand::thread_rng());

    Ok(Json(SlotListing {
        doctor_id: doctor.id.to_string(),
        date: query.date,
        total_slots: slots.len(),
        slots,
        simulated: true,
    }))
}
