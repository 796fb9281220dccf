use chrono::NaiveDate;

use crate::models::WorkingHours;

pub const WORKING_HOURS: WorkingHours = WorkingHours {
    start_hour: 9,
    end_hour: 18,
    slot_minutes: 30,
};

impl WorkingHours {
    pub fn slot_labels(&self) -> Vec<String> {
        (self.start_hour * 60..self.end_hour * 60)
            .step_by(self.slot_minutes as usize)
            .map(|minutes| format_time_label(minutes / 60, minutes % 60))
            .collect()
    }
}

/// Bookable half-hour labels for `date`, in order. Opening hours are the
/// same every day, so the date only scopes the result.
pub fn generate_time_slots(_date: NaiveDate) -> Vec<String> {
    WORKING_HOURS.slot_labels()
}

pub fn format_time_label(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

/// Accepts `H:MM`, `HH:MM` and `HH:MM:00`.
pub fn parse_time_label(label: &str) -> Option<(u32, u32)> {
    let mut parts = label.trim().split(':');

    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;

    if let Some(seconds) = parts.next() {
        if seconds.trim().parse::<u32>().ok()? != 0 {
            return None;
        }
    }

    if parts.next().is_some() || hour > 23 || minute > 59 {
        return None;
    }

    Some((hour, minute))
}

/// Canonical `HH:MM` form; labels that don't parse are returned trimmed.
pub fn normalize_time_label(label: &str) -> String {
    match parse_time_label(label) {
        Some((hour, minute)) => format_time_label(hour, minute),
        None => label.trim().to_string(),
    }
}

pub fn is_within_working_hours(label: &str) -> bool {
    let normalized = normalize_time_label(label);
    WORKING_HOURS.slot_labels().contains(&normalized)
}
