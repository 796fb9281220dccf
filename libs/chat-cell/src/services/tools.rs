// libs/chat-cell/src/services/tools.rs
use serde_json::{json, Value};

use doctor_cell::doctor_ids;

use crate::models::ToolName;

/// Tool declarations sent with every completion request, wrapped in the
/// `{"type": "function", "function": ...}` envelope.
pub fn tool_definitions() -> Vec<Value> {
    ToolName::ALL
        .into_iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": function_declaration(tool),
            })
        })
        .collect()
}

fn function_declaration(tool: ToolName) -> Value {
    let doctors = doctor_ids();

    match tool {
        ToolName::BookAppointment => json!({
            "name": tool.as_str(),
            "description": "Book a new appointment with a doctor",
            "parameters": {
                "type": "object",
                "properties": {
                    "patientName": { "type": "string", "description": "Full name of the patient" },
                    "patientAge": { "type": "integer", "description": "Age of the patient" },
                    "patientPhone": { "type": "string", "description": "Contact phone number" },
                    "doctorId": { "type": "string", "enum": doctors, "description": "ID of the doctor" },
                    "date": { "type": "string", "description": "Appointment date (YYYY-MM-DD)" },
                    "time": { "type": "string", "description": "Appointment time (HH:MM)" },
                    "treatment": { "type": "string", "description": "Treatment or procedure type" }
                },
                "required": ["patientName", "patientAge", "patientPhone", "doctorId", "date", "time"]
            }
        }),
        ToolName::CancelAppointment => json!({
            "name": tool.as_str(),
            "description": "Cancel an existing appointment",
            "parameters": {
                "type": "object",
                "properties": {
                    "appointmentId": { "type": "string", "description": "ID of the appointment to cancel" }
                },
                "required": ["appointmentId"]
            }
        }),
        ToolName::RescheduleAppointment => json!({
            "name": tool.as_str(),
            "description": "Reschedule an existing appointment to a new date/time",
            "parameters": {
                "type": "object",
                "properties": {
                    "appointmentId": { "type": "string", "description": "ID of the appointment to reschedule" },
                    "date": { "type": "string", "description": "New appointment date (YYYY-MM-DD)" },
                    "time": { "type": "string", "description": "New appointment time (HH:MM)" }
                },
                "required": ["appointmentId", "date", "time"]
            }
        }),
        ToolName::CheckAvailability => json!({
            "name": tool.as_str(),
            "description": "Check doctor availability for a specific date",
            "parameters": {
                "type": "object",
                "properties": {
                    "doctorId": { "type": "string", "enum": doctors, "description": "ID of the doctor" },
                    "date": { "type": "string", "description": "Date to check (YYYY-MM-DD)" }
                },
                "required": ["doctorId", "date"]
            }
        }),
        ToolName::GetAppointmentDetails => json!({
            "name": tool.as_str(),
            "description": "Get details of appointments",
            "parameters": {
                "type": "object",
                "properties": {
                    "patientPhone": { "type": "string", "description": "Patient phone number to search appointments" }
                },
                "required": []
            }
        }),
    }
}
