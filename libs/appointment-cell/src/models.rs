// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::normalize_time_label;
use shared_database::StorageError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Opaque appointment identifier. Bookings made here get a UUID; records
/// arriving from clients may carry any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(String);

impl AppointmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, as shown to patients.
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AppointmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AppointmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_name: String,
    #[serde(deserialize_with = "deserialize_age")]
    pub patient_age: u32,
    pub patient_phone: String,
    pub doctor_id: String,
    #[serde(default)]
    pub doctor_name: String,
    pub date: NaiveDate,
    /// Half-hour label, `HH:MM`.
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether this appointment holds the (doctor, date, time) reservation.
    pub fn occupies(&self, doctor_id: &str, date: NaiveDate, time: &str) -> bool {
        self.is_active()
            && self.doctor_id == doctor_id
            && self.date == date
            && normalize_time_label(&self.time) == normalize_time_label(time)
    }

    pub fn short_id(&self) -> String {
        self.id.short()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Everything except a cancellation keeps its slot reserved.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

/// Ages arrive from JSON-schema "number" fields, so `34.0` is as valid as
/// `34`. Fractions and negatives are rejected.
fn deserialize_age<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;

    if raw.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&raw) {
        Ok(raw as u32)
    } else {
        Err(de::Error::custom(format!("invalid patient age: {}", raw)))
    }
}

// ==============================================================================
// ACTION ARGUMENTS
// ==============================================================================
//
// These double as the JSON arguments of the model's tool calls, so field
// names follow the tool schema.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentArgs {
    pub patient_name: String,
    #[serde(deserialize_with = "deserialize_age")]
    pub patient_age: u32,
    pub patient_phone: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
}

impl BookAppointmentArgs {
    pub fn normalized(mut self) -> Self {
        self.time = normalize_time_label(&self.time);
        self.patient_name = self.patient_name.trim().to_string();
        self.patient_phone = self.patient_phone.trim().to_string();
        self.treatment = self
            .treatment
            .map(|treatment| treatment.trim().to_string())
            .filter(|treatment| !treatment.is_empty());
        self
    }

    pub fn slot(&self) -> ConflictCheckRequest {
        ConflictCheckRequest {
            doctor_id: self.doctor_id.clone(),
            date: self.date,
            time: self.time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentArgs {
    pub appointment_id: String,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentArgs {
    pub appointment_id: String,
}

/// Body of the REST reschedule endpoint; the id comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time: String,
}

/// Field replacement applied by `AppointmentRepository::update_by_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub treatment: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentPatch {
    pub fn reschedule(date: NaiveDate, time: &str) -> Self {
        Self {
            date: Some(date),
            time: Some(normalize_time_label(time)),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(time) = &self.time {
            appointment.time = time.clone();
        }
        if let Some(treatment) = &self.treatment {
            appointment.treatment = Some(treatment.clone());
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
    }
}

// ==============================================================================
// CONFLICT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckRequest {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRejection {
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub suggestions: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingDecision {
    Proceed,
    Rejected(ConflictRejection),
}

impl BookingDecision {
    pub fn is_conflict(&self) -> bool {
        matches!(self, BookingDecision::Rejected(_))
    }
}

// ==============================================================================
// PERSISTENCE AND STATS
// ==============================================================================

/// Layout of the persisted slot: `{"version": 1, "state": {"appointments": [...]}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedAppointments {
    pub version: u32,
    pub state: PersistedState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone)]
pub enum StoreEvent {
    Appended(Appointment),
    Updated(Appointment),
    Cancelled(Appointment),
    /// The whole list was swapped in from another instance.
    Replaced { count: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentStats {
    pub total: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub rescheduled: usize,
    pub today: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSearchQuery {
    pub patient_phone: Option<String>,
    pub doctor_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

impl AppointmentSearchQuery {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_phone
            .as_deref()
            .map_or(true, |phone| appointment.patient_phone == phone.trim())
            && self
                .doctor_id
                .as_deref()
                .map_or(true, |doctor_id| appointment.doctor_id == doctor_id)
            && self.status.map_or(true, |status| appointment.status == status)
            && self.date.map_or(true, |date| appointment.date == date)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Appointment {0} not found")]
    NotFound(String),

    #[error("Appointment reference {0} matches more than one appointment")]
    AmbiguousReference(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error("{}", .0.message)]
    ConflictDetected(ConflictRejection),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
