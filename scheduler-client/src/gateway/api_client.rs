use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::GatewayError;
use crate::meeting::{Meeting, Participant, ParticipantAck};

use super::types::*;
use super::Gateway;

/// HTTP gateway to the scheduling service.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Meetings ────────────────────────────────────────────────────────

    pub async fn create_meeting(
        &self,
        request: &CreateMeetingRequest,
    ) -> Result<Meeting, GatewayError> {
        let url = self.endpoint(&["meetings"])?;
        log::debug!("POST {}", url);

        let resp = self.client.post(url).json(request).send().await?;
        let created: CreatedMeetingPayload = read_json(resp).await?;

        Ok(created.into_meeting(request))
    }

    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, GatewayError> {
        let url = self.endpoint(&["meetings", meeting_id])?;
        log::debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;
        let payload: MeetingPayload = read_json(resp).await?;

        Ok(payload.into())
    }

    // ── Participants ────────────────────────────────────────────────────

    pub async fn add_participant(
        &self,
        meeting_id: &str,
        participant: &Participant,
    ) -> Result<ParticipantAck, GatewayError> {
        let url = self.endpoint(&["meetings", meeting_id, "participants"])?;
        log::debug!("POST {}", url);

        let resp = self
            .client
            .post(url)
            .json(&AddParticipantRequest::from(participant))
            .send()
            .await?;
        let ack: ParticipantResponse = read_json(resp).await?;

        Ok(ack.into())
    }

    pub async fn list_participants(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<Participant>, GatewayError> {
        let url = self.endpoint(&["meetings", meeting_id, "participants"])?;
        log::debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;
        let payload: ParticipantsPayload = read_json(resp).await?;

        Ok(payload.into())
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, GatewayError> {
        ApiClient::create_meeting(self, request).await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, GatewayError> {
        ApiClient::get_meeting(self, meeting_id).await
    }

    async fn add_participant(
        &self,
        meeting_id: &str,
        participant: &Participant,
    ) -> Result<ParticipantAck, GatewayError> {
        ApiClient::add_participant(self, meeting_id, participant).await
    }

    async fn list_participants(&self, meeting_id: &str) -> Result<Vec<Participant>, GatewayError> {
        ApiClient::list_participants(self, meeting_id).await
    }
}

/// Fail on non-success statuses, otherwise decode the body as `T`.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    let status = resp.status();
    if !status.is_success() {
        // The status alone decides the error; an unreadable body only loses the detail.
        let body = resp.text().await.unwrap_or_default();
        log::debug!("Request failed with {}: {}", status, body);
        return Err(GatewayError::api(status.as_u16(), &body));
    }

    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}
