//! Wire payloads of the scheduling service. Time fields travel as
//! `start_time` / `end_time`; conversions into the domain types live here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::meeting::{AvailabilityMap, Meeting, NewMeeting, Participant, ParticipantAck, TimeOfDay};

// ── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMeetingRequest {
    pub name: String,
    pub organizer: String,
    pub dates: Vec<NaiveDate>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub created_at: DateTime<Utc>,
}

impl CreateMeetingRequest {
    pub fn stamped(meeting: &NewMeeting) -> Self {
        Self {
            name: meeting.name.clone(),
            organizer: meeting.organizer.clone(),
            dates: meeting.dates.clone(),
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddParticipantRequest {
    pub name: String,
    pub comment: Option<String>,
    pub availability: AvailabilityMap,
}

impl From<&Participant> for AddParticipantRequest {
    fn from(p: &Participant) -> Self {
        Self {
            name: p.name.clone(),
            comment: p.comment.clone(),
            availability: p.availability.clone(),
        }
    }
}

// ── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingPayload {
    #[serde(alias = "meeting_id")]
    pub id: String,
    pub name: String,
    pub organizer: String,
    pub dates: Vec<NaiveDate>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
}

impl From<MeetingPayload> for Meeting {
    fn from(p: MeetingPayload) -> Self {
        Meeting {
            id: p.id,
            name: p.name,
            organizer: p.organizer,
            dates: p.dates,
            start_time: p.start_time,
            end_time: p.end_time,
            participants: p.participants,
            join_url: p.join_url,
        }
    }
}

/// Reply to `POST /meetings`. Some deployments echo the whole meeting,
/// others only `{"meeting_id", "join_url"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedMeetingPayload {
    #[serde(alias = "meeting_id")]
    pub id: String,
    pub name: Option<String>,
    pub organizer: Option<String>,
    pub dates: Option<Vec<NaiveDate>>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub join_url: Option<String>,
}

impl CreatedMeetingPayload {
    /// Fill whatever the server left out from the request that was sent.
    pub fn into_meeting(self, sent: &CreateMeetingRequest) -> Meeting {
        Meeting {
            id: self.id,
            name: self.name.unwrap_or_else(|| sent.name.clone()),
            organizer: self.organizer.unwrap_or_else(|| sent.organizer.clone()),
            dates: self.dates.unwrap_or_else(|| sent.dates.clone()),
            start_time: self.start_time.unwrap_or(sent.start_time),
            end_time: self.end_time.unwrap_or(sent.end_time),
            participants: self.participants,
            join_url: self.join_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParticipantsPayload {
    List(Vec<Participant>),
    Wrapped { participants: Vec<Participant> },
}

impl From<ParticipantsPayload> for Vec<Participant> {
    fn from(p: ParticipantsPayload) -> Self {
        match p {
            ParticipantsPayload::List(list) => list,
            ParticipantsPayload::Wrapped { participants } => participants,
        }
    }
}

/// Bare acknowledgement, e.g. `{"status": "success"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AckPayload {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParticipantResponse {
    Meeting(MeetingPayload),
    Participant(Participant),
    Ack(AckPayload),
}

impl From<ParticipantResponse> for ParticipantAck {
    fn from(r: ParticipantResponse) -> Self {
        match r {
            ParticipantResponse::Meeting(m) => ParticipantAck::Meeting(m.into()),
            ParticipantResponse::Participant(p) => ParticipantAck::Participant(p),
            ParticipantResponse::Ack(ack) => {
                log::debug!("Participant registration acknowledged: {}", ack.status);
                ParticipantAck::Accepted
            }
        }
    }
}
