// libs/appointment-cell/src/services/conflict.rs
use chrono::NaiveDate;
use tracing::{debug, warn};

use doctor_cell::{doctor_name, generate_time_slots, normalize_time_label};

use crate::models::{Appointment, BookingDecision, ConflictCheckRequest, ConflictRejection};

pub const MAX_SUGGESTIONS: usize = 6;

/// Booking guard. Decides whether a slot is free; committing the
/// appointment is left to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetectionService;

impl ConflictDetectionService {
    pub fn new() -> Self {
        Self
    }

    pub fn check_booking(
        &self,
        request: &ConflictCheckRequest,
        appointments: &[Appointment],
    ) -> BookingDecision {
        let time = normalize_time_label(&request.time);
        debug!(
            "Checking conflicts for doctor {} on {} at {}",
            request.doctor_id, request.date, time
        );

        let has_conflict = appointments
            .iter()
            .any(|apt| apt.occupies(&request.doctor_id, request.date, &time));

        if !has_conflict {
            return BookingDecision::Proceed;
        }

        let suggestions = self.suggest_alternatives(&request.doctor_id, request.date, appointments);
        let doctor_name = doctor_name(&request.doctor_id).to_string();
        let message = rejection_message(&doctor_name, request.date, &time, &suggestions);

        warn!(
            "Conflict detected for doctor {} on {} at {} - {} alternatives offered",
            request.doctor_id,
            request.date,
            time,
            suggestions.len()
        );

        BookingDecision::Rejected(ConflictRejection {
            doctor_id: request.doctor_id.clone(),
            doctor_name,
            date: request.date,
            time,
            suggestions,
            message,
        })
    }

    /// Times already reserved for the doctor on `date`.
    pub fn held_times(&self, doctor_id: &str, date: NaiveDate, appointments: &[Appointment]) -> Vec<String> {
        appointments
            .iter()
            .filter(|apt| apt.is_active() && apt.doctor_id == doctor_id && apt.date == date)
            .map(|apt| normalize_time_label(&apt.time))
            .collect()
    }

    /// Free working-hour slots for the doctor on `date`, earliest first.
    pub fn free_slots(&self, doctor_id: &str, date: NaiveDate, appointments: &[Appointment]) -> Vec<String> {
        let held = self.held_times(doctor_id, date, appointments);

        generate_time_slots(date)
            .into_iter()
            .filter(|slot| !held.contains(slot))
            .collect()
    }

    pub fn suggest_alternatives(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        appointments: &[Appointment],
    ) -> Vec<String> {
        let mut free = self.free_slots(doctor_id, date, appointments);
        free.truncate(MAX_SUGGESTIONS);
        free
    }

    /// Another active appointment already on the slot `appointment` sits in.
    pub fn find_collision<'a>(
        &self,
        appointment: &Appointment,
        appointments: &'a [Appointment],
    ) -> Option<&'a Appointment> {
        appointments.iter().find(|other| {
            other.id != appointment.id
                && other.occupies(&appointment.doctor_id, appointment.date, &appointment.time)
        })
    }
}

fn rejection_message(doctor_name: &str, date: NaiveDate, time: &str, suggestions: &[String]) -> String {
    let mut message = format!(
        "Sorry, {} already has an appointment on {} at {}.",
        doctor_name, date, time
    );

    if suggestions.is_empty() {
        message.push_str(" Please pick another time or date.");
    } else {
        message.push_str(&format!(
            " Here are some available times on that date: {}. Would you like one of these?",
            suggestions.join(", ")
        ));
    }

    message
}
