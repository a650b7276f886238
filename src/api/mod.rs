//! Backend gateway.
//!
//! [`client::ApiClient`] is the only type that talks HTTP. View models depend
//! on the gateway traits below so they can run against a stub backend.

pub mod ai;
pub mod auth;
pub mod client;
pub mod registro;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::ai::AiResponse;
use crate::models::message::{ChatHistoryItem, MediaBlob};
use crate::models::registro::{Registro, RegistroCreate, RegistroResponse};
use crate::models::sensor::{SensorValidationRequest, SensorValidationResult};
use crate::models::summary::UserAssessmentSummary;

pub use client::ApiClient;

#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn process_text(&self, text: &str, session_id: Option<&str>) -> AppResult<AiResponse>;

    async fn process_voice(&self, clip: &MediaBlob, session_id: Option<&str>) -> AppResult<AiResponse>;

    async fn process_image(&self, image: &MediaBlob, session_id: Option<&str>) -> AppResult<AiResponse>;

    async fn chat_history(&self) -> AppResult<Vec<ChatHistoryItem>>;

    async fn clear_conversation(&self) -> AppResult<()>;

    async fn validate_with_sensors(
        &self,
        request: &SensorValidationRequest,
    ) -> AppResult<SensorValidationResult>;
}

#[async_trait]
pub trait SummaryGateway: Send + Sync {
    async fn assessment_summary(&self, days: u32) -> AppResult<UserAssessmentSummary>;
}

#[async_trait]
pub trait RegistroGateway: Send + Sync {
    async fn submit_registro(&self, registro: &RegistroCreate) -> AppResult<RegistroResponse>;

    async fn registro_by_email(&self, email: &str) -> AppResult<Registro>;
}
