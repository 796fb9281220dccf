// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use doctor_cell::{doctor_name, find_doctor, parse_time_label};

use crate::models::{
    Appointment, AppointmentError, AppointmentId, AppointmentPatch, AppointmentStatus, BookAppointmentArgs,
    BookingDecision, CancelAppointmentArgs, RescheduleAppointmentArgs,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::store::AppointmentRepository;

/// Commits booking actions to the repository.
pub struct AppointmentBookingService {
    repository: Arc<AppointmentRepository>,
    conflicts: ConflictDetectionService,
}

impl AppointmentBookingService {
    pub fn new(repository: Arc<AppointmentRepository>) -> Self {
        Self {
            repository,
            conflicts: ConflictDetectionService::new(),
        }
    }

    pub fn repository(&self) -> &Arc<AppointmentRepository> {
        &self.repository
    }

    /// Creates a confirmed appointment. The slot is checked again against
    /// the live list, which may have moved on since the caller looked.
    pub async fn book(&self, args: BookAppointmentArgs) -> Result<Appointment, AppointmentError> {
        let args = args.normalized();
        validate_booking(&args)?;

        let doctor = find_doctor(&args.doctor_id)
            .ok_or_else(|| AppointmentError::DoctorNotFound(args.doctor_id.clone()))?;

        let slot = args.slot();
        let appointment = Appointment {
            id: AppointmentId::generate(),
            patient_name: args.patient_name,
            patient_age: args.patient_age,
            patient_phone: args.patient_phone,
            doctor_id: doctor.id.to_string(),
            doctor_name: doctor.name.to_string(),
            date: args.date,
            time: args.time,
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
            treatment: args.treatment,
        };

        let conflicts = self.conflicts;
        let booked = self
            .repository
            .append_guarded(appointment, |existing| match conflicts.check_booking(&slot, existing) {
                BookingDecision::Proceed => Ok(()),
                BookingDecision::Rejected(rejection) => Err(AppointmentError::ConflictDetected(rejection)),
            })
            .await?;

        info!(
            "Appointment {} booked with {} on {} at {}",
            booked.id, booked.doctor_id, booked.date, booked.time
        );
        Ok(booked)
    }

    /// Moves an appointment to a new date and time. Status is left as it
    /// was and the new slot is not checked for conflicts; a collision is
    /// only logged.
    pub async fn reschedule(&self, args: RescheduleAppointmentArgs) -> Result<Appointment, AppointmentError> {
        let current = self.repository.resolve_reference(&args.appointment_id).await?;

        if parse_time_label(&args.time).is_none() {
            return Err(AppointmentError::ValidationError(format!(
                "Invalid appointment time: {}",
                args.time
            )));
        }

        let updated = self
            .repository
            .update_by_id(&current.id, AppointmentPatch::reschedule(args.date, &args.time))
            .await?;

        let snapshot = self.repository.all().await;
        if let Some(other) = self.conflicts.find_collision(&updated, &snapshot) {
            warn!(
                "Rescheduled appointment {} now shares {} {} with appointment {}",
                updated.id, updated.date, updated.time, other.id
            );
        }

        info!("Appointment {} rescheduled to {} at {}", updated.id, updated.date, updated.time);
        Ok(updated)
    }

    pub async fn cancel(&self, args: CancelAppointmentArgs) -> Result<Appointment, AppointmentError> {
        let current = self.repository.resolve_reference(&args.appointment_id).await?;
        let cancelled = self.repository.cancel_by_id(&current.id).await?;

        info!("Appointment {} cancelled", cancelled.id);
        Ok(cancelled)
    }
}

fn validate_booking(args: &BookAppointmentArgs) -> Result<(), AppointmentError> {
    if args.patient_name.is_empty() {
        return Err(AppointmentError::ValidationError("Patient name is required".to_string()));
    }

    if args.patient_phone.is_empty() {
        return Err(AppointmentError::ValidationError("Patient phone is required".to_string()));
    }

    if parse_time_label(&args.time).is_none() {
        return Err(AppointmentError::ValidationError(format!(
            "Invalid appointment time: {}",
            args.time
        )));
    }

    Ok(())
}

// ==============================================================================
// PATIENT-FACING CONFIRMATIONS
// ==============================================================================

pub fn booking_confirmation(appointment: &Appointment) -> String {
    let doctor = if appointment.doctor_name.is_empty() {
        doctor_name(&appointment.doctor_id).to_string()
    } else {
        appointment.doctor_name.clone()
    };

    format!(
        "✅ Excellent! Your appointment has been confirmed:\n\n\
         **Appointment Details:**\n\
         • Patient: {}\n\
         • Doctor: {}\n\
         • Date: {}\n\
         • Time: {}\n\
         • Treatment: {}\n\
         • Appointment ID: {}\n\n\
         We'll send a confirmation to {}. \
         Please arrive 15 minutes early for registration. Is there anything else I can help you with?",
        appointment.patient_name,
        doctor,
        appointment.date,
        appointment.time,
        appointment.treatment.as_deref().unwrap_or("Consultation"),
        appointment.short_id(),
        appointment.patient_phone,
    )
}

pub fn reschedule_confirmation(appointment: &Appointment) -> String {
    format!(
        "✅ Your appointment has been rescheduled to {} at {}. Is there anything else I can assist you with?",
        appointment.date, appointment.time
    )
}

pub fn cancellation_confirmation() -> String {
    "Your appointment has been cancelled successfully. Would you like to schedule a new appointment?"
        .to_string()
}
