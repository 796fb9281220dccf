// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, BookAppointmentArgs, BookingDecision,
    CancelAppointmentArgs, ConflictCheckRequest, RescheduleAppointmentArgs, RescheduleRequest,
    StoreError,
};
use crate::services::booking::{
    booking_confirmation, cancellation_confirmation, reschedule_confirmation,
    AppointmentBookingService,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::store::AppointmentRepository;

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(reference) => {
                AppError::NotFound(format!("Appointment {} not found", reference))
            }
            StoreError::AmbiguousReference(reference) => AppError::BadRequest(format!(
                "Appointment reference {} matches more than one appointment",
                reference
            )),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::DoctorNotFound(doctor_id) => {
                AppError::NotFound(format!("Doctor {} not found", doctor_id))
            }
            AppointmentError::ConflictDetected(rejection) => AppError::Conflict {
                message: rejection.message.clone(),
                details: Some(json!({
                    "suggestions": rejection.suggestions,
                    "doctorId": rejection.doctor_id,
                    "date": rejection.date,
                    "time": rejection.time,
                })),
            },
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Store(store) => store.into(),
        }
    }
}

// ==============================================================================
// LISTINGS
// ==============================================================================

pub async fn list_appointments(
    State(repository): State<Arc<AppointmentRepository>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Json<Value> {
    let appointments: Vec<Appointment> = repository
        .all()
        .await
        .into_iter()
        .filter(|apt| query.matches(apt))
        .collect();

    Json(json!({
        "total": appointments.len(),
        "appointments": appointments
    }))
}

pub async fn get_appointment(
    State(repository): State<Arc<AppointmentRepository>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = repository.resolve_reference(&appointment_id).await?;
    Ok(Json(appointment))
}

pub async fn get_doctor_appointments(
    State(repository): State<Arc<AppointmentRepository>>,
    Path(doctor_id): Path<String>,
) -> Json<Value> {
    let appointments = repository.by_doctor_confirmed(&doctor_id).await;

    Json(json!({
        "doctorId": doctor_id,
        "total": appointments.len(),
        "appointments": appointments
    }))
}

pub async fn get_appointment_stats(
    State(repository): State<Arc<AppointmentRepository>>,
) -> Json<Value> {
    let today = Local::now().date_naive();
    let stats = repository.stats(today).await;

    Json(json!({
        "date": today,
        "stats": stats
    }))
}

pub async fn check_appointment_conflicts(
    State(repository): State<Arc<AppointmentRepository>>,
    Query(request): Query<ConflictCheckRequest>,
) -> Json<Value> {
    let appointments = repository.all().await;
    let decision = ConflictDetectionService::new().check_booking(&request, &appointments);

    match decision {
        BookingDecision::Proceed => Json(json!({
            "hasConflict": false,
            "suggestions": [],
            "message": null
        })),
        BookingDecision::Rejected(rejection) => Json(json!({
            "hasConflict": true,
            "suggestions": rejection.suggestions,
            "message": rejection.message
        })),
    }
}

// ==============================================================================
// COMMANDS
// ==============================================================================

pub async fn book_appointment(
    State(repository): State<Arc<AppointmentRepository>>,
    Json(request): Json<BookAppointmentArgs>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = AppointmentBookingService::new(repository);
    let appointment = booking_service.book(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": booking_confirmation(&appointment),
            "appointment": appointment
        })),
    ))
}

pub async fn reschedule_appointment(
    State(repository): State<Arc<AppointmentRepository>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(repository);
    let appointment = booking_service
        .reschedule(RescheduleAppointmentArgs {
            appointment_id,
            date: request.date,
            time: request.time,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": reschedule_confirmation(&appointment),
        "appointment": appointment
    })))
}

pub async fn cancel_appointment(
    State(repository): State<Arc<AppointmentRepository>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(repository);
    let appointment = booking_service
        .cancel(CancelAppointmentArgs { appointment_id })
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": cancellation_confirmation(),
        "appointment": appointment
    })))
}
