use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::api::client::ApiClient;
use crate::api::{AiGateway, SummaryGateway};
use crate::config::endpoints;
use crate::error::{AppError, AppResult};
use crate::models::ai::{AiResponse, ProcessTextRequest};
use crate::models::message::{ChatHistoryItem, MediaBlob};
use crate::models::sensor::{SensorValidationRequest, SensorValidationResult};
use crate::models::summary::UserAssessmentSummary;

fn upload_form(field: &'static str, blob: &MediaBlob, session_id: Option<&str>) -> AppResult<Form> {
    let part = Part::bytes(blob.bytes.to_vec())
        .file_name(blob.file_name.clone())
        .mime_str(&blob.mime)
        .map_err(|e| AppError::Validation(format!("Invalid media type {}: {e}", blob.mime)))?;

    let mut form = Form::new().part(field, part);
    if let Some(id) = session_id {
        form = form.text("session_id", id.to_string());
    }
    Ok(form)
}

#[async_trait]
impl AiGateway for ApiClient {
    async fn process_text(&self, text: &str, session_id: Option<&str>) -> AppResult<AiResponse> {
        log::debug!("process_text: text_len={}, session={:?}", text.len(), session_id);
        let req = self
            .endpoint(Method::POST, endpoints::AI_PROCESS_TEXT)
            .json(&ProcessTextRequest { text, session_id });
        self.send_json(req).await
    }

    async fn process_voice(&self, clip: &MediaBlob, session_id: Option<&str>) -> AppResult<AiResponse> {
        log::debug!("process_voice: bytes={}, session={:?}", clip.len(), session_id);
        let form = upload_form("audio", clip, session_id)?;
        let req = self.endpoint(Method::POST, endpoints::AI_PROCESS_VOICE).multipart(form);
        self.send_json(req).await
    }

    async fn process_image(&self, image: &MediaBlob, session_id: Option<&str>) -> AppResult<AiResponse> {
        log::debug!("process_image: bytes={}, session={:?}", image.len(), session_id);
        let form = upload_form("image", image, session_id)?;
        let req = self.endpoint(Method::POST, endpoints::AI_PROCESS_IMAGE).multipart(form);
        self.send_json(req).await
    }

    async fn chat_history(&self) -> AppResult<Vec<ChatHistoryItem>> {
        let req = self.endpoint(Method::GET, endpoints::AI_CHAT_HISTORY);
        self.send_json(req).await
    }

    async fn clear_conversation(&self) -> AppResult<()> {
        let req = self.endpoint(Method::DELETE, endpoints::AI_CLEAR_CONVERSATION);
        self.send_empty(req).await
    }

    async fn validate_with_sensors(
        &self,
        request: &SensorValidationRequest,
    ) -> AppResult<SensorValidationResult> {
        log::info!(
            "Sensor validation: type={:?}, probability={}",
            request.input_type,
            request.probability
        );
        let req = self
            .request(Method::POST, self.config().sensor_url())
            .json(request);
        self.send_json(req).await
    }
}

#[async_trait]
impl SummaryGateway for ApiClient {
    async fn assessment_summary(&self, days: u32) -> AppResult<UserAssessmentSummary> {
        let req = self
            .endpoint(Method::GET, endpoints::AI_ASSESSMENT_SUMMARY)
            .query(&[("days", days)]);
        self.send_json(req).await
    }
}
