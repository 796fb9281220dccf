use chrono::NaiveDate;
use rand::Rng;
use tracing::debug;

use crate::services::slots::generate_time_slots;

/// Chance that a slot shows up as free in a simulated listing.
pub const MOCK_SLOT_KEEP_PROBABILITY: f64 = 0.7;

/// Simulated availability: every working-hour slot is kept independently
/// at random. Not derived from booked appointments.
pub fn mock_available_slots<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Vec<String> {
    let slots: Vec<String> = generate_time_slots(date)
        .into_iter()
        .filter(|_| rng.gen_bool(MOCK_SLOT_KEEP_PROBABILITY))
        .collect();

    debug!("Simulated {} free slots on {}", slots.len(), date);
    slots
}
