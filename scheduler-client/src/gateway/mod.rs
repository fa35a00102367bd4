pub mod api_client;
pub mod retry;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::meeting::{Meeting, Participant, ParticipantAck};

pub use api_client::ApiClient;
pub use retry::RetryPolicy;
pub use types::CreateMeetingRequest;

/// Remote scheduling service as seen by the store.
///
/// Implementations translate between wire payloads and domain types; the
/// store never sees `start_time`-style field names.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `POST /meetings`
    async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, GatewayError>;

    /// `GET /meetings/{id}`
    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, GatewayError>;

    /// `POST /meetings/{id}/participants`
    async fn add_participant(
        &self,
        meeting_id: &str,
        participant: &Participant,
    ) -> Result<ParticipantAck, GatewayError>;

    /// `GET /meetings/{id}/participants`
    async fn list_participants(&self, meeting_id: &str) -> Result<Vec<Participant>, GatewayError>;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, GatewayError> {
        (**self).create_meeting(request).await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, GatewayError> {
        (**self).get_meeting(meeting_id).await
    }

    async fn add_participant(
        &self,
        meeting_id: &str,
        participant: &Participant,
    ) -> Result<ParticipantAck, GatewayError> {
        (**self).add_participant(meeting_id, participant).await
    }

    async fn list_participants(&self, meeting_id: &str) -> Result<Vec<Participant>, GatewayError> {
        (**self).list_participants(meeting_id).await
    }
}
