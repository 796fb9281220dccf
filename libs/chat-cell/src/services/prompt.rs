// libs/chat-cell/src/services/prompt.rs
use appointment_cell::models::Appointment;
use doctor_cell::DOCTORS;

use crate::models::ToolName;

pub const GREETING: &str = "Hello! Welcome to Dezy Clinic. I can help you book appointments, \
learn about our treatments, or answer questions about our plastic surgery services. \
How may I assist you today?";

const ROLE_AND_GUIDELINES: &str = "You are a helpful AI assistant for Dezy Clinic, a plastic surgery clinic. Your role is to:

1. Help patients book, reschedule, or cancel appointments
2. Provide information about treatments and doctors
3. Answer pre-operative and post-operative care questions
4. Only handle clinic-related queries

IMPORTANT GUIDELINES:
- Be professional, empathetic, and helpful
- Collect patient name, age, and phone number for bookings
- Only book appointments between 9 AM and 6 PM
- Politely decline non-medical or out-of-scope questions";

const BOOKING_FLOW: &str = "When a user wants to book an appointment:
1. Ask which treatment they're interested in
2. Recommend the appropriate doctor
3. Check available dates and times
4. Collect patient information (name, age, phone)
5. Confirm the appointment";

/// System instruction for one completion request. The appointment snapshot
/// is appended as JSON when it is non-empty.
pub fn system_instruction(appointments: &[Appointment]) -> String {
    let mut prompt = format!(
        "{ROLE_AND_GUIDELINES}\n\nCLINIC INFORMATION:\nDoctors:\n{}\n\n{BOOKING_FLOW}\n\nFor function calls, you have access to:\n{}",
        doctor_section(),
        tool_section()
    );

    if !appointments.is_empty() {
        match serde_json::to_string(appointments) {
            Ok(snapshot) => {
                prompt.push_str("\n\nCurrent appointments in system: ");
                prompt.push_str(&snapshot);
            }
            Err(e) => tracing::warn!("Failed to serialize appointment context: {}", e),
        }
    }

    prompt
}

fn doctor_section() -> String {
    DOCTORS
        .iter()
        .enumerate()
        .map(|(index, doctor)| {
            format!(
                "{}. {} ({})\n   - Specialties: {}",
                index + 1,
                doctor.display_name(),
                doctor.id,
                doctor.specialties.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn tool_section() -> String {
    ToolName::ALL
        .iter()
        .map(|tool| {
            let summary = match tool {
                ToolName::BookAppointment => "Books a new appointment",
                ToolName::RescheduleAppointment => "Changes date/time of an existing appointment",
                ToolName::CancelAppointment => "Cancels an existing appointment",
                ToolName::CheckAvailability => "Checks doctor availability",
                ToolName::GetAppointmentDetails => "Gets details of an appointment",
            };
            format!("- {}: {}", tool, summary)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
