// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use shared_database::{KeyValueStore, StorageEvent};

use crate::models::{
    Appointment, AppointmentId, AppointmentPatch, AppointmentStats, AppointmentStatus, PersistedAppointments,
    PersistedState, StoreError, StoreEvent,
};

pub const STORE_VERSION: u32 = 1;

/// Shortest id prefix accepted by `resolve_reference`; matches the
/// short id shown in booking confirmations.
pub const MIN_REFERENCE_PREFIX: usize = 8;

/// Owns the appointment list. Every mutation writes the full list to one
/// named slot and is announced to local subscribers.
///
/// Instances sharing a slot converge through [`spawn_sync_listener`]: the
/// most recent write from another instance replaces the local list (last
/// write wins).
pub struct AppointmentRepository {
    appointments: RwLock<Vec<Appointment>>,
    backend: Arc<dyn KeyValueStore>,
    slot: String,
    events: broadcast::Sender<StoreEvent>,
}

impl AppointmentRepository {
    pub fn new(backend: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(256);

        Self {
            appointments: RwLock::new(Vec::new()),
            backend,
            slot: slot.into(),
            events,
        }
    }

    /// Creates the repository and hydrates it from the slot. A missing or
    /// unreadable slot starts empty.
    pub async fn load(backend: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Result<Self, StoreError> {
        let repository = Self::new(backend, slot);
        repository.reload().await?;
        Ok(repository)
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn reload(&self) -> Result<usize, StoreError> {
        let loaded = match self.backend.get(&self.slot).await? {
            Some(raw) => decode_slot(&raw).unwrap_or_else(|| {
                warn!("Slot {} holds unreadable data, starting empty", self.slot);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let count = loaded.len();
        *self.appointments.write().await = loaded;
        info!("Loaded {} appointments from slot {}", count, self.slot);
        Ok(count)
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    pub async fn all(&self) -> Vec<Appointment> {
        self.appointments.read().await.clone()
    }

    pub async fn by_id(&self, id: &AppointmentId) -> Option<Appointment> {
        self.appointments
            .read()
            .await
            .iter()
            .find(|apt| &apt.id == id)
            .cloned()
    }

    /// Confirmed appointments only; cancelled and rescheduled ones are left out.
    pub async fn by_doctor_confirmed(&self, doctor_id: &str) -> Vec<Appointment> {
        self.appointments
            .read()
            .await
            .iter()
            .filter(|apt| apt.doctor_id == doctor_id && apt.status == AppointmentStatus::Confirmed)
            .cloned()
            .collect()
    }

    /// Resolves a full id, or an id prefix of at least
    /// [`MIN_REFERENCE_PREFIX`] characters (case-insensitive) that matches
    /// exactly one record.
    pub async fn resolve_reference(&self, reference: &str) -> Result<Appointment, StoreError> {
        let reference = reference.trim();
        let appointments = self.appointments.read().await;

        if let Some(found) = appointments.iter().find(|apt| apt.id.as_str() == reference) {
            return Ok(found.clone());
        }

        let reference = reference.to_ascii_lowercase();
        if reference.chars().count() < MIN_REFERENCE_PREFIX {
            return Err(StoreError::NotFound(reference));
        }

        let mut matches = appointments
            .iter()
            .filter(|apt| apt.id.as_str().to_ascii_lowercase().starts_with(&reference));

        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found.clone()),
            (Some(_), Some(_)) => Err(StoreError::AmbiguousReference(reference.clone())),
            _ => Err(StoreError::NotFound(reference.clone())),
        }
    }

    pub async fn stats(&self, today: NaiveDate) -> AppointmentStats {
        let appointments = self.appointments.read().await;

        AppointmentStats {
            total: appointments.len(),
            confirmed: count_status(&appointments, AppointmentStatus::Confirmed),
            cancelled: count_status(&appointments, AppointmentStatus::Cancelled),
            rescheduled: count_status(&appointments, AppointmentStatus::Rescheduled),
            today: appointments.iter().filter(|apt| apt.date == today).count(),
        }
    }

    // ==============================================================================
    // COMMANDS
    // ==============================================================================

    pub async fn append(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        self.append_guarded(appointment, |_| Ok::<(), StoreError>(())).await
    }

    /// Appends after `guard` accepts the current list. The guard and the
    /// write happen under one lock, so two bookings cannot both pass a
    /// check against the same list.
    pub async fn append_guarded<G, E>(&self, appointment: Appointment, guard: G) -> Result<Appointment, E>
    where
        G: FnOnce(&[Appointment]) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut appointments = self.appointments.write().await;
        guard(appointments.as_slice())?;

        let mut next = appointments.clone();
        next.push(appointment.clone());
        self.persist(&next).await?;
        *appointments = next;
        drop(appointments);

        debug!("Appointment {} appended", appointment.id);
        self.publish(StoreEvent::Appended(appointment.clone()));
        Ok(appointment)
    }

    pub async fn update_by_id(&self, id: &AppointmentId, patch: AppointmentPatch) -> Result<Appointment, StoreError> {
        let updated = self.modify(id, |apt| patch.apply_to(apt)).await?;
        self.publish(StoreEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Marks the appointment cancelled. The record is kept.
    pub async fn cancel_by_id(&self, id: &AppointmentId) -> Result<Appointment, StoreError> {
        let cancelled = self
            .modify(id, |apt| apt.status = AppointmentStatus::Cancelled)
            .await?;
        self.publish(StoreEvent::Cancelled(cancelled.clone()));
        Ok(cancelled)
    }

    /// Applies a write made by another instance. Returns whether the local
    /// list was replaced; events for other slots, our own writes and
    /// unreadable payloads are ignored.
    pub async fn apply_remote(&self, event: &StorageEvent) -> bool {
        if event.key != self.slot || event.origin == self.backend.origin() {
            return false;
        }

        let Some(raw) = event.new_value.as_deref() else {
            return false;
        };

        let Some(incoming) = decode_slot(raw) else {
            warn!("Ignoring malformed update for slot {}", self.slot);
            return false;
        };

        let count = incoming.len();
        *self.appointments.write().await = incoming;

        debug!("Slot {} replaced from instance {} ({} appointments)", self.slot, event.origin, count);
        self.publish(StoreEvent::Replaced { count });
        true
    }

    async fn modify<F>(&self, id: &AppointmentId, change: F) -> Result<Appointment, StoreError>
    where
        F: FnOnce(&mut Appointment),
    {
        let mut appointments = self.appointments.write().await;

        let mut next = appointments.clone();
        let target = next
            .iter_mut()
            .find(|apt| &apt.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        change(target);
        let updated = target.clone();

        self.persist(&next).await?;
        *appointments = next;

        Ok(updated)
    }

    async fn persist(&self, appointments: &[Appointment]) -> Result<(), StoreError> {
        let payload = PersistedAppointments {
            version: STORE_VERSION,
            state: PersistedState {
                appointments: appointments.to_vec(),
            },
        };

        let raw = serde_json::to_string(&payload)?;
        self.backend.set(&self.slot, &raw).await?;
        Ok(())
    }

    fn publish(&self, event: StoreEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}

fn count_status(appointments: &[Appointment], status: AppointmentStatus) -> usize {
    appointments.iter().filter(|apt| apt.status == status).count()
}

fn decode_slot(raw: &str) -> Option<Vec<Appointment>> {
    serde_json::from_str::<PersistedAppointments>(raw)
        .ok()
        .map(|persisted| persisted.state.appointments)
}

/// Keeps `repository` in step with writes from other instances sharing its
/// backend.
pub fn spawn_sync_listener(repository: Arc<AppointmentRepository>) -> JoinHandle<()> {
    let mut receiver = repository.backend.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    repository.apply_remote(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Store sync lagged by {} events, reloading slot", skipped);
                    if let Err(e) = repository.reload().await {
                        warn!("Failed to reload slot {}: {}", repository.slot, e);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Storage notifications closed, stopping store sync");
                    break;
                }
            }
        }
    })
}
