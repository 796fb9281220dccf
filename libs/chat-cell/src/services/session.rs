// libs/chat-cell/src/services/session.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use appointment_cell::api::AppointmentBookingService;
use appointment_cell::models::{
    AppointmentError, BookAppointmentArgs, CancelAppointmentArgs, RescheduleAppointmentArgs,
};
use appointment_cell::services::{booking_confirmation, cancellation_confirmation, reschedule_confirmation};

use crate::models::{ChatError, ChatMessage, ChatRequest, ChatResponse, FunctionCall, ToolName};
use crate::services::handler::ChatRequestHandler;
use crate::services::prompt::GREETING;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// One patient conversation. The transcript only ever grows.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    /// Unix millis of the last turn.
    last_active: AtomicI64,
    transcript: RwLock<Vec<ChatMessage>>,
    turn: Mutex<()>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        let created_at = Utc::now();

        Self {
            id: Uuid::new_v4(),
            created_at,
            last_active: AtomicI64::new(created_at.timestamp_millis()),
            transcript: RwLock::new(vec![ChatMessage::assistant(GREETING)]),
            turn: Mutex::new(()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.turn.try_lock().is_err()
    }

    fn touch(&self) {
        self.touch_at(Utc::now());
    }

    fn touch_at(&self, at: DateTime<Utc>) {
        self.last_active.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    fn last_active_millis(&self) -> i64 {
        self.last_active.load(Ordering::Relaxed)
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            messages: self.messages().await,
        }
    }

    async fn push(&self, message: ChatMessage) -> ChatMessage {
        self.transcript.write().await.push(message.clone());
        message
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs conversation turns: asks the handler for a reply and commits any
/// resulting action through the booking service.
pub struct ConversationService {
    handler: Arc<ChatRequestHandler>,
    booking: Arc<AppointmentBookingService>,
    clinic_phone: String,
}

impl ConversationService {
    pub fn new(
        handler: Arc<ChatRequestHandler>,
        booking: Arc<AppointmentBookingService>,
        clinic_phone: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            booking,
            clinic_phone: clinic_phone.into(),
        }
    }

    pub fn apology(&self) -> String {
        format!(
            "I apologize, but I encountered an error. Please try again or contact our clinic directly at {}.",
            self.clinic_phone
        )
    }

    /// Processes one user message and returns the messages appended during
    /// the turn, the user's own message first.
    ///
    /// Fails only for empty input or when another turn is still running;
    /// every other failure is reported to the patient as an apology.
    pub async fn submit(&self, session: &ChatSession, text: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let _turn = session.turn.try_lock().map_err(|_| ChatError::Busy)?;
        session.touch();

        let mut appended = vec![session.push(ChatMessage::user(text)).await];

        let reply = match self.run_turn(session).await {
            Ok(Some(reply)) => Some(reply),
            Ok(None) => None,
            Err(ChatError::Booking(AppointmentError::ConflictDetected(rejection))) => {
                info!("Session {} booking lost the slot: {}", session.id, rejection.message);
                Some(ChatMessage::assistant(rejection.message))
            }
            Err(e) => {
                error!("Chat turn failed for session {}: {}", session.id, e);
                Some(ChatMessage::assistant(self.apology()))
            }
        };

        if let Some(reply) = reply {
            appended.push(session.push(reply).await);
        }
        session.touch();

        Ok(appended)
    }

    async fn run_turn(&self, session: &ChatSession) -> Result<Option<ChatMessage>, ChatError> {
        let request = ChatRequest {
            messages: session
                .transcript
                .read()
                .await
                .iter()
                .map(ChatMessage::to_transcript)
                .collect(),
            appointments: self.booking.repository().all().await,
        };

        let response = self.handler.handle(request).await?;
        self.apply(response).await
    }

    async fn apply(&self, response: ChatResponse) -> Result<Option<ChatMessage>, ChatError> {
        let ChatResponse { content, function_call } = response;

        let Some(call) = function_call else {
            return Ok(non_empty(content).map(ChatMessage::assistant));
        };

        let confirmation = match ToolName::parse(&call.name) {
            Some(ToolName::BookAppointment) => {
                let args: BookAppointmentArgs = parse_action(&call)?;
                let appointment = self.booking.book(args).await?;
                booking_confirmation(&appointment)
            }
            Some(ToolName::RescheduleAppointment) => {
                let args: RescheduleAppointmentArgs = parse_action(&call)?;
                let appointment = self.booking.reschedule(args).await?;
                reschedule_confirmation(&appointment)
            }
            Some(ToolName::CancelAppointment) => {
                let args: CancelAppointmentArgs = parse_action(&call)?;
                self.booking.cancel(args).await?;
                cancellation_confirmation()
            }
            _ => {
                warn!("No action handler for {}, showing the model's reply", call.name);
                return Ok(non_empty(content).map(ChatMessage::assistant));
            }
        };

        debug!("Applied {} action", call.name);
        Ok(Some(ChatMessage::assistant(confirmation).with_function_call(call)))
    }
}

fn parse_action<T: serde::de::DeserializeOwned>(call: &FunctionCall) -> Result<T, ChatError> {
    serde_json::from_str(&call.arguments).map_err(|source| ChatError::InvalidArguments {
        tool: call.name.clone(),
        source,
    })
}

fn non_empty(content: String) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

/// Live conversations, keyed by session id.
///
/// Sessions idle for longer than the TTL are dropped, and once the registry
/// is full the least recently active one makes room for a new session.
/// Sessions in the middle of a turn are never evicted.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<ChatSession>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn create(&self) -> Arc<ChatSession> {
        let session = Arc::new(ChatSession::new());

        let mut sessions = self.sessions.write().await;
        self.evict(&mut sessions, Utc::now());
        sessions.insert(session.id(), Arc::clone(&session));
        drop(sessions);

        info!("Chat session {} started", session.id());
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<ChatSession>, ChatError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Drops expired sessions as of `now`. Returns how many were removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        self.evict(&mut sessions, now)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes idle sessions, then the least recently active ones until
    /// there is room for one more.
    fn evict(&self, sessions: &mut HashMap<Uuid, Arc<ChatSession>>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();
        let ttl_millis = i64::try_from(self.idle_ttl.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.timestamp_millis().saturating_sub(ttl_millis);

        sessions.retain(|_, session| session.is_busy() || session.last_active_millis() >= cutoff);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .filter(|session| !session.is_busy())
                .min_by_key(|session| session.last_active_millis())
                .map(|session| session.id());

            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => {
                    warn!("Session registry full with every session mid-turn");
                    break;
                }
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} chat sessions", evicted);
        }
        evicted
    }
}
