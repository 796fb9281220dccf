use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A clinic doctor. The directory is compiled in and never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub specialties: &'static [&'static str],
}

impl Doctor {
    pub fn display_name(&self) -> String {
        format!("Dr. {}, {}", self.name, self.title)
    }

    pub fn offers(&self, treatment: &str) -> bool {
        self.specialties
            .iter()
            .any(|specialty| specialty.eq_ignore_ascii_case(treatment.trim()))
    }
}

/// Clinic opening hours, shared by every doctor and every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkingHours {
    pub start_hour: u32,
    /// Exclusive.
    pub end_hour: u32,
    pub slot_minutes: u32,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotListing {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub total_slots: usize,
    /// True when the listing is randomised mock data rather than derived
    /// from booked appointments.
    pub simulated: bool,
}
