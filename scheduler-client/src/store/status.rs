use std::collections::HashMap;

use crate::meeting::{derive_slots, Meeting, Participant, Slot};

/// Logical store operations, each with its own loading/error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateMeeting,
    FetchMeeting,
    AddParticipant,
    ListParticipants,
}

impl Operation {
    /// Whether a successful call replaces the current meeting.
    pub fn replaces_meeting(&self) -> bool {
        matches!(self, Operation::CreateMeeting | Operation::FetchMeeting)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    /// Calls of this operation that have not settled yet.
    pub in_flight: u32,
    /// Failure message of the most recently started call, if it failed.
    pub error: Option<String>,
    latest_ticket: u64,
}

impl OperationStatus {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Everything a view needs to render, published after every change.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub current_meeting: Option<Meeting>,
    /// Mirrors `current_meeting.participants`.
    pub participants: Vec<Participant>,
    statuses: HashMap<Operation, OperationStatus>,
    /// Ticket of the most recently started create or fetch.
    meeting_ticket: u64,
}

impl StoreSnapshot {
    pub fn status(&self, operation: Operation) -> OperationStatus {
        self.statuses.get(&operation).cloned().unwrap_or_default()
    }

    pub fn error(&self, operation: Operation) -> Option<&str> {
        self.statuses
            .get(&operation)
            .and_then(|s| s.error.as_deref())
    }

    /// Error of whichever operation was started most recently, if it failed.
    pub fn is_loading(&self) -> bool {
        self.statuses.values().any(OperationStatus::is_loading)
    }

    /// Slots of the current meeting, derived fresh on every call.
    pub fn slots(&self) -> Vec<Slot> {
        derive_slots(self.current_meeting.as_ref())
    }

    pub(crate) fn begin(&mut self, operation: Operation, ticket: u64, in_flight: bool) {
        let status = self.statuses.entry(operation).or_default();
        if in_flight {
            status.in_flight += 1;
        }
        status.error = None;
        status.latest_ticket = ticket;
        if operation.replaces_meeting() {
            self.meeting_ticket = ticket;
        }
    }

    pub(crate) fn settle(&mut self, operation: Operation) {
        let status = self.statuses.entry(operation).or_default();
        status.in_flight = status.in_flight.saturating_sub(1);
    }

    /// Record a failure, unless a newer call of the same operation started since.
    pub(crate) fn fail(&mut self, operation: Operation, ticket: u64, message: &str) {
        let status = self.statuses.entry(operation).or_default();
        if status.latest_ticket == ticket {
            status.error = Some(message.to_string());
        }
    }

    /// Replace the current meeting if `ticket` belongs to the most recently
    /// started create or fetch, whatever that call's outcome. Returns false
    /// when the response is stale and was dropped.
    pub(crate) fn replace_meeting(&mut self, meeting: Meeting, ticket: u64) -> bool {
        if ticket != self.meeting_ticket {
            return false;
        }
        self.participants = meeting.participants.clone();
        self.current_meeting = Some(meeting);
        true
    }

    /// Keep the mirror and the meeting's own list in step.
    pub(crate) fn set_participants(&mut self, meeting_id: &str, participants: Vec<Participant>) {
        if let Some(meeting) = self
            .current_meeting
            .as_mut()
            .filter(|m| m.id == meeting_id)
        {
            meeting.participants = participants.clone();
            self.participants = participants;
        }
    }

    pub(crate) fn push_participant(&mut self, meeting_id: &str, participant: Participant) {
        if let Some(meeting) = self
            .current_meeting
            .as_mut()
            .filter(|m| m.id == meeting_id)
        {
            meeting.participants.push(participant.clone());
            self.participants.push(participant);
        }
    }
}
