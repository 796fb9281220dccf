// libs/chat-cell/src/services/handler.rs
use std::sync::Arc;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use appointment_cell::api::ConflictDetectionService;
use appointment_cell::models::{Appointment, BookAppointmentArgs, BookingDecision, RescheduleAppointmentArgs};
use doctor_cell::{doctor_name, mock_available_slots};
use shared_config::AppConfig;

use crate::models::{
    AppointmentDetailsArgs, AssistantMessage, ChatError, ChatRequest, ChatResponse, ChatRole,
    CheckAvailabilityArgs, CompletionRequest, FunctionCall, ToolName, TranscriptMessage,
};
use crate::services::llm::ChatCompletionClient;
use crate::services::prompt::system_instruction;
use crate::services::tools::tool_definitions;

pub const RESCHEDULE_ACKNOWLEDGEMENT: &str = "Sure, I can update that appointment for you.";

/// Turns a transcript plus an appointment snapshot into either a reply or an
/// action for the caller to commit. Never writes to the appointment store.
pub struct ChatRequestHandler {
    client: Arc<dyn ChatCompletionClient>,
    conflicts: ConflictDetectionService,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatRequestHandler {
    pub fn new(client: Arc<dyn ChatCompletionClient>, config: &AppConfig) -> Self {
        Self {
            client,
            conflicts: ConflictDetectionService::new(),
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let completion = self.build_completion_request(&request.messages, &request.appointments);
        let message = self.client.complete(&completion).await?;
        self.interpret(message, &request.appointments, &mut rand::thread_rng())
    }

    pub fn build_completion_request(
        &self,
        transcript: &[TranscriptMessage],
        appointments: &[Appointment],
    ) -> CompletionRequest {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(TranscriptMessage {
            role: ChatRole::System,
            content: system_instruction(appointments),
        });
        messages.extend_from_slice(transcript);

        CompletionRequest {
            model: self.model.clone(),
            messages,
            tools: tool_definitions(),
            tool_choice: "auto".to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Applies the tool-call rules to the model's reply. Only the first tool
    /// call is considered.
    pub fn interpret<R: Rng + ?Sized>(
        &self,
        message: AssistantMessage,
        appointments: &[Appointment],
        rng: &mut R,
    ) -> Result<ChatResponse, ChatError> {
        let content = message.content.unwrap_or_default();

        let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) else {
            return Ok(ChatResponse::text(content));
        };

        let name = call.function.name;
        let raw_arguments = call.function.arguments;
        debug!("Model requested tool {}", name);

        match ToolName::parse(&name) {
            Some(ToolName::BookAppointment) => {
                let args = parse_arguments::<BookAppointmentArgs>(&name, &raw_arguments)?.normalized();

                match self.conflicts.check_booking(&args.slot(), appointments) {
                    BookingDecision::Rejected(rejection) => Ok(ChatResponse::text(rejection.message)),
                    BookingDecision::Proceed => {
                        info!(
                            "Booking for doctor {} on {} at {} passed conflict check",
                            args.doctor_id, args.date, args.time
                        );
                        let arguments = serde_json::to_string(&args)?;
                        Ok(ChatResponse::action(content, FunctionCall { name, arguments }))
                    }
                }
            }
            Some(ToolName::CheckAvailability) => {
                let args = parse_arguments::<CheckAvailabilityArgs>(&name, &raw_arguments)?;
                let slots = mock_available_slots(args.date, rng);
                Ok(ChatResponse::text(availability_reply(&args, &slots)))
            }
            Some(ToolName::RescheduleAppointment) => {
                let args = parse_arguments::<RescheduleAppointmentArgs>(&name, &raw_arguments)?;
                let arguments = serde_json::to_string(&args)?;
                Ok(ChatResponse::action(
                    RESCHEDULE_ACKNOWLEDGEMENT,
                    FunctionCall { name, arguments },
                ))
            }
            Some(ToolName::GetAppointmentDetails) => {
                let args = parse_arguments::<AppointmentDetailsArgs>(&name, &raw_arguments)?;
                Ok(ChatResponse::text(details_reply(&args, appointments)))
            }
            Some(ToolName::CancelAppointment) | None => {
                // Pass-through actions still have to carry valid JSON.
                parse_arguments::<Value>(&name, &raw_arguments)?;
                if ToolName::parse(&name).is_none() {
                    warn!("Model requested undeclared tool {}, passing it through", name);
                }
                Ok(ChatResponse::action(
                    content,
                    FunctionCall {
                        name,
                        arguments: raw_arguments,
                    },
                ))
            }
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, raw: &str) -> Result<T, ChatError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|source| ChatError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

fn availability_reply(args: &CheckAvailabilityArgs, slots: &[String]) -> String {
    let doctor = doctor_name(&args.doctor_id);

    if slots.is_empty() {
        return format!(
            "I've checked the availability for {} on {}. Unfortunately there are no open time slots that day. Would you like to try another date?",
            doctor, args.date
        );
    }

    format!(
        "I've checked the availability for {} on {}. Available time slots are: {}. Which time would you prefer?",
        doctor,
        args.date,
        slots.join(", ")
    )
}

fn details_reply(args: &AppointmentDetailsArgs, appointments: &[Appointment]) -> String {
    let phone = args
        .patient_phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty());

    let matching: Vec<&Appointment> = appointments
        .iter()
        .filter(|apt| phone.map_or(true, |phone| apt.patient_phone == phone))
        .collect();

    if matching.is_empty() {
        return match phone {
            Some(phone) => format!("I couldn't find any appointments for {}.", phone),
            None => "I couldn't find any appointments.".to_string(),
        };
    }

    let lines = matching
        .iter()
        .map(|apt| {
            format!(
                "• {} with {} on {} at {} (status: {})",
                apt.patient_name,
                doctor_name(&apt.doctor_id),
                apt.date,
                apt.time,
                apt.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Here are the appointment details:\n{}", lines)
}
