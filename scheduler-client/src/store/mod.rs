mod status;

pub use status::{Operation, OperationStatus, StoreSnapshot};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{Config, Locale};
use crate::error::{GatewayError, StoreError};
use crate::gateway::{CreateMeetingRequest, Gateway, RetryPolicy};
use crate::meeting::{unknown_slot_keys, Meeting, NewMeeting, Participant, ParticipantAck, Slot};
use crate::notify::Notifications;

/// Holds the loaded meeting and drives the three network operations.
///
/// Every operation reports its own outcome through its return value. The
/// shared snapshot additionally tracks loading and error state per
/// [`Operation`], and only the most recently started meeting-replacing call
/// may overwrite `current_meeting`.
pub struct MeetingStore<G> {
    gateway: G,
    state: watch::Sender<StoreSnapshot>,
    tickets: AtomicU64,
    retry: RetryPolicy,
    locale: Locale,
    notifications: Notifications,
    /// Pending reminder for the last meeting this store created.
    reminder: Mutex<Option<JoinHandle<()>>>,
}

/// Settles an operation's in-flight count when the call ends, including
/// when its future is dropped part way.
struct InFlight<'a> {
    state: &'a watch::Sender<StoreSnapshot>,
    operation: Operation,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let operation = self.operation;
        self.state.send_modify(|s| s.settle(operation));
    }
}

impl<G: Gateway> MeetingStore<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_config(gateway, &Config::default())
    }

    pub fn with_config(gateway: G, config: &Config) -> Self {
        let (state, _) = watch::channel(StoreSnapshot::default());
        Self {
            gateway,
            state,
            tickets: AtomicU64::new(0),
            retry: RetryPolicy::from_config(config),
            locale: config.locale,
            notifications: Notifications::disabled(),
            reminder: Mutex::new(None),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }

    // ── Observation ─────────────────────────────────────────────────────

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    pub fn current_meeting(&self) -> Option<Meeting> {
        self.state.borrow().current_meeting.clone()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.state.borrow().participants.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn status(&self, operation: Operation) -> OperationStatus {
        self.state.borrow().status(operation)
    }

    pub fn error(&self, operation: Operation) -> Option<String> {
        self.state.borrow().error(operation).map(str::to_string)
    }

    pub fn slots(&self) -> Vec<Slot> {
        self.state.borrow().slots()
    }

    // ── Operations ──────────────────────────────────────────────────────

    pub async fn create_meeting(&self, meeting: NewMeeting) -> Result<Meeting, StoreError> {
        let operation = Operation::CreateMeeting;
        let (ticket, _guard) = self.begin(operation);
        let request = CreateMeetingRequest::stamped(&meeting);
        slog!("Creating meeting {:?} for {} dates", request.name, request.dates.len());

        let result = self.gateway.create_meeting(&request).await;
        let created = self.conclude(operation, ticket, result)?;

        self.apply_meeting(&created, ticket);
        self.remind_before(&created);
        slog!("Created meeting {} ({})", created.id, created.share_path());
        Ok(created)
    }

    /// Load a meeting by id, retrying transient failures per the retry policy.
    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, StoreError> {
        let operation = Operation::FetchMeeting;
        let (ticket, _guard) = self.begin(operation);
        slog!("Fetching meeting {}", meeting_id);

        let result = self
            .retry
            .run("fetch meeting", || self.gateway.get_meeting(meeting_id))
            .await;
        let meeting = self.conclude(operation, ticket, result)?;

        self.apply_meeting(&meeting, ticket);
        slog!(
            "Loaded meeting {} with {} participant(s)",
            meeting.id,
            meeting.participants.len()
        );
        Ok(meeting)
    }

    /// Submit a participant's availability for `meeting_id`, which must be
    /// the currently loaded meeting. Every availability key must be one of
    /// its slots; the request is not sent otherwise.
    pub async fn add_participant(
        &self,
        meeting_id: &str,
        participant: Participant,
    ) -> Result<ParticipantAck, StoreError> {
        let operation = Operation::AddParticipant;
        let meeting = self.validate_participant(meeting_id, &participant)?;

        let (ticket, _guard) = self.begin(operation);
        slog!("Registering {} for meeting {}", participant.name, meeting_id);

        let result = self.gateway.add_participant(meeting_id, &participant).await;
        let ack = self.conclude(operation, ticket, result)?;

        let stored = match &ack {
            ParticipantAck::Participant(p) => p.clone(),
            ParticipantAck::Meeting(m) => m
                .participants
                .iter()
                .rev()
                .find(|p| p.name == participant.name)
                .cloned()
                .unwrap_or(participant),
            ParticipantAck::Accepted => participant,
        };
        self.state
            .send_modify(|s| s.push_participant(meeting_id, stored));

        self.notifications.meeting_joined(&meeting.name);
        Ok(ack)
    }

    /// Reload the participant list of `meeting_id`. If it is the loaded
    /// meeting, the mirror is replaced and newcomers are announced.
    pub async fn refresh_participants(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<Participant>, StoreError> {
        let operation = Operation::ListParticipants;
        let (ticket, _guard) = self.begin(operation);

        let result = self.gateway.list_participants(meeting_id).await;
        let participants = self.conclude(operation, ticket, result)?;

        let mut newcomers = Vec::new();
        let mut meeting_name = None;
        self.state.send_modify(|s| {
            if let Some(meeting) = s.current_meeting.as_ref().filter(|m| m.id == meeting_id) {
                meeting_name = Some(meeting.name.clone());
                newcomers = participants
                    .iter()
                    .filter(|p| !s.participants.iter().any(|known| known.name == p.name))
                    .map(|p| p.name.clone())
                    .collect();
            }
            s.set_participants(meeting_id, participants.clone());
        });

        if let Some(name) = meeting_name {
            for newcomer in &newcomers {
                self.notifications.new_participant(&name, newcomer);
            }
        }
        Ok(participants)
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Mark `operation` as loading with a cleared error.
    fn begin(&self, operation: Operation) -> (u64, InFlight<'_>) {
        let ticket = self.next_ticket();
        self.state
            .send_modify(|s| s.begin(operation, ticket, true));
        let guard = InFlight {
            state: &self.state,
            operation,
        };
        (ticket, guard)
    }

    /// Turn a gateway result into the caller's result, recording failures.
    fn conclude<T>(
        &self,
        operation: Operation,
        ticket: u64,
        result: Result<T, GatewayError>,
    ) -> Result<T, StoreError> {
        result.map_err(|e| {
            log::error!("{:?} failed: {}", operation, e);
            let err = StoreError::from_gateway(operation, e, self.locale);
            self.state
                .send_modify(|s| s.fail(operation, ticket, &err.message));
            err
        })
    }

    /// Replace any pending reminder with one for `meeting`'s first slot.
    fn remind_before(&self, meeting: &Meeting) {
        let Some(due) = meeting.first_slot_start() else {
            return;
        };
        let handle = self.notifications.schedule_reminder(&meeting.name, due);
        if let Ok(mut pending) = self.reminder.lock() {
            if let Some(previous) = std::mem::replace(&mut *pending, handle) {
                previous.abort();
            }
        }
    }

    fn apply_meeting(&self, meeting: &Meeting, ticket: u64) {
        let mut applied = true;
        self.state
            .send_modify(|s| applied = s.replace_meeting(meeting.clone(), ticket));
        if !applied {
            log::warn!(
                "Dropping stale response for meeting {}; a newer request has started since",
                meeting.id
            );
        }
    }

    /// Reject a registration without a round trip. Validation failures are
    /// recorded like any other failure of the operation.
    fn validate_participant(
        &self,
        meeting_id: &str,
        participant: &Participant,
    ) -> Result<Meeting, StoreError> {
        let operation = Operation::AddParticipant;
        let meeting = self
            .current_meeting()
            .filter(|m| m.id == meeting_id);

        let problem = if participant.name.trim().is_empty() {
            Some("Participant name is required".to_string())
        } else if let Some(meeting) = &meeting {
            let unknown = unknown_slot_keys(meeting, &participant.availability);
            (!unknown.is_empty()).then(|| format!("Unknown slots: {}", unknown.join(", ")))
        } else {
            Some(format!("Meeting {} is not loaded", meeting_id))
        };

        match (problem, meeting) {
            (None, Some(meeting)) => Ok(meeting),
            (problem, _) => {
                let message = problem.unwrap_or_default();
                let ticket = self.next_ticket();
                self.state.send_modify(|s| {
                    s.begin(operation, ticket, false);
                    s.fail(operation, ticket, &message);
                });
                log::warn!("Rejected registration for {}: {}", meeting_id, message);
                Err(StoreError::validation(operation, message))
            }
        }
    }
}

impl<G> Drop for MeetingStore<G> {
    fn drop(&mut self) {
        if let Ok(pending) = self.reminder.get_mut() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}
