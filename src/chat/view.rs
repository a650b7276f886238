//! Conversation view model.
//!
//! Holds the ordered message history and session continuity for the chat
//! screen. History is append-only between loads and clears; the `loading`
//! flag is the single-flight guard for sends.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::api::AiGateway;
use crate::chat::expansion::ExpansionState;
use crate::chat::render::{self, MessageUiState, MessageView};
use crate::error::{AppError, AppResult};
use crate::models::ai::AiResponse;
use crate::models::assessment::{AssessmentDetail, AssessmentType};
use crate::models::message::{ChatMessage, MediaBlob, MediaRef, MessagePayload};
use crate::models::sensor::{SensorInputType, SensorValidationRequest, SensorValidationResult};

pub const CLEAR_PROMPT: &str = "¿Estás seguro de que quieres limpiar toda la conversación?";

pub struct ConversationView {
    gateway: Arc<dyn AiGateway>,
    media_base: String,
    history: Vec<ChatMessage>,
    session_id: Option<String>,
    loading: bool,
    error: Option<String>,
    clear_pending: bool,
    expansion: ExpansionState,
    validating: HashSet<i64>,
    validations: HashMap<i64, SensorValidationResult>,
    last_id: i64,
}

impl ConversationView {
    pub fn new(gateway: Arc<dyn AiGateway>, media_base: impl Into<String>) -> Self {
        Self {
            gateway,
            media_base: media_base.into(),
            history: Vec::new(),
            session_id: None,
            loading: false,
            error: None,
            clear_pending: false,
            expansion: ExpansionState::new(),
            validating: HashSet::new(),
            validations: HashMap::new(),
            last_id: 0,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn message(&self, id: i64) -> Option<&ChatMessage> {
        self.history.iter().find(|m| m.id == id)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Drops everything tied to the visible history. The next send starts a new session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.session_id = None;
        self.error = None;
        self.clear_pending = false;
        self.expansion.clear();
        self.validating.clear();
        self.validations.clear();
    }

    /// Replaces history with the backend's copy. Failure degrades to an empty history.
    pub async fn load_history(&mut self) {
        self.reset();
        match self.gateway.chat_history().await {
            Ok(items) => {
                log::info!("Loaded {} history entries", items.len());
                self.history = items.into_iter().map(ChatMessage::from).collect();
                self.last_id = self.history.iter().map(|m| m.id).max().unwrap_or(0).max(self.last_id);
            }
            Err(e) => log::warn!("Chat history unavailable: {}", e),
        }
    }

    pub async fn submit_text(&mut self, text: &str) -> AppResult<i64> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("message is empty".into()));
        }
        self.begin_send()?;

        let gateway = Arc::clone(&self.gateway);
        let session = self.session_id.clone();
        let result = gateway.process_text(text, session.as_deref()).await;
        self.finish_send(result, MessagePayload::Text(text.to_string()))
    }

    pub async fn submit_voice(&mut self, clip: MediaBlob) -> AppResult<i64> {
        if clip.is_empty() {
            return Err(AppError::Validation("recording is empty".into()));
        }
        self.begin_send()?;

        let gateway = Arc::clone(&self.gateway);
        let session = self.session_id.clone();
        let result = gateway.process_voice(&clip, session.as_deref()).await;
        self.finish_send(result, MessagePayload::Audio(MediaRef::Local(clip)))
    }

    pub async fn submit_image(&mut self, image: MediaBlob) -> AppResult<i64> {
        if image.is_empty() {
            return Err(AppError::Validation("image is empty".into()));
        }
        self.begin_send()?;

        let gateway = Arc::clone(&self.gateway);
        let session = self.session_id.clone();
        let result = gateway.process_image(&image, session.as_deref()).await;
        self.finish_send(result, MessagePayload::Image(MediaRef::Local(image)))
    }

    fn begin_send(&mut self) -> AppResult<()> {
        if self.loading {
            log::debug!("Send rejected, another request is in flight");
            return Err(AppError::Busy);
        }
        self.loading = true;
        self.error = None;
        Ok(())
    }

    fn finish_send(&mut self, result: AppResult<AiResponse>, payload: MessagePayload) -> AppResult<i64> {
        self.loading = false;
        let res = match result {
            Ok(res) => res,
            Err(e) => {
                log::warn!("Send failed: {}", e);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        if self.session_id.as_deref() != Some(res.session_id.as_str()) {
            log::info!("Conversation session is now {}", res.session_id);
        }
        self.session_id = Some(res.session_id);

        let id = self.next_id();
        self.history.push(ChatMessage {
            id,
            payload,
            response: res.output,
            created_at: chrono::Utc::now().to_rfc3339(),
            assessment: res.assessment,
            risk_level: res.risk_level,
            depression_classification: res.depression_classification,
        });
        Ok(id)
    }

    /// Millisecond timestamp, bumped when two messages land in the same millisecond.
    fn next_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }

    /// Opens the confirmation step; nothing is cleared yet.
    pub fn request_clear(&mut self) {
        self.clear_pending = true;
    }

    pub fn is_clear_pending(&self) -> bool {
        self.clear_pending
    }

    pub fn cancel_clear(&mut self) {
        self.clear_pending = false;
    }

    /// Clears history and session together. Returns `false` when no
    /// confirmation was pending.
    pub async fn confirm_clear(&mut self) -> AppResult<bool> {
        if !self.clear_pending {
            return Ok(false);
        }
        self.clear_pending = false;

        if let Err(e) = self.gateway.clear_conversation().await {
            log::warn!("Clear conversation failed: {}", e);
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.reset();
        log::info!("Conversation cleared");
        Ok(true)
    }

    pub fn toggle_details(&mut self, id: i64) -> bool {
        self.expansion.toggle(id)
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expansion.is_expanded(id)
    }

    pub fn is_validating(&self, id: i64) -> bool {
        self.validating.contains(&id)
    }

    pub fn validation(&self, id: i64) -> Option<&SensorValidationResult> {
        self.validations.get(&id)
    }

    /// Forwards a message's depression result to the physical sensor. Backend
    /// failures are recorded as unsuccessful results rather than returned.
    pub async fn validate_with_sensors(&mut self, id: i64) -> AppResult<SensorValidationResult> {
        let msg = self
            .message(id)
            .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;
        let request = sensor_request(msg)
            .ok_or_else(|| AppError::Validation(format!("Message {id} has no depression result")))?;

        if !self.validating.insert(id) {
            return Err(AppError::Busy);
        }
        let gateway = Arc::clone(&self.gateway);
        let result = match gateway.validate_with_sensors(&request).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Sensor validation failed for {}: {}", id, e);
                SensorValidationResult::failed(e.to_string())
            }
        };
        self.validating.remove(&id);
        self.validations.insert(id, result.clone());
        Ok(result)
    }

    pub fn message_views(&self) -> Vec<MessageView> {
        self.history
            .iter()
            .map(|msg| {
                let ui = MessageUiState {
                    expanded: self.is_expanded(msg.id),
                    validating: self.is_validating(msg.id),
                    sensor: self.validation(msg.id),
                };
                render::render_message(msg, ui, &self.media_base)
            })
            .collect()
    }
}

/// Sensor payload for a message, if it carries a depression result.
pub fn sensor_request(msg: &ChatMessage) -> Option<SensorValidationRequest> {
    if let Some(assessment) = &msg.assessment {
        if assessment.kind != Some(AssessmentType::Depression) {
            return None;
        }
        let AssessmentDetail::Depression(d) = &assessment.detail else {
            return None;
        };
        return Some(SensorValidationRequest {
            probability: format!("{:.1}", d.probability_depression * 100.0),
            level: if d.level.is_empty() { "Bajo".into() } else { d.level.clone() },
            confidence: d.score,
            input_type: SensorInputType::Text,
        });
    }

    match (&msg.payload, &msg.depression_classification) {
        (MessagePayload::Image(_), Some(c)) if c.is_depression => Some(SensorValidationRequest {
            probability: format!("{:.1}", c.probability_depression() * 100.0),
            level: render::image_risk(c.confidence).0.to_string(),
            confidence: c.confidence,
            input_type: SensorInputType::Image,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::render::{Bubble, HIGH_COLOR};
    use crate::models::assessment::{Assessment, DepressionAssessment, DepressionClassification, RiskLevel};
    use crate::models::message::ChatHistoryItem;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubGateway {
        replies: Mutex<VecDeque<AppResult<AiResponse>>>,
        sent_sessions: Mutex<Vec<Option<String>>>,
        history: Mutex<Option<AppResult<Vec<ChatHistoryItem>>>>,
        clear_fails: bool,
        clears: Mutex<u32>,
        sensor: Mutex<Option<AppResult<SensorValidationResult>>>,
    }

    impl StubGateway {
        fn reply(&self, r: AppResult<AiResponse>) {
            self.replies.lock().unwrap().push_back(r);
        }

        fn next(&self, session_id: Option<&str>) -> AppResult<AiResponse> {
            self.sent_sessions.lock().unwrap().push(session_id.map(String::from));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Network("no reply queued".into())))
        }
    }

    #[async_trait]
    impl AiGateway for StubGateway {
        async fn process_text(&self, _text: &str, session_id: Option<&str>) -> AppResult<AiResponse> {
            self.next(session_id)
        }

        async fn process_voice(&self, _clip: &MediaBlob, session_id: Option<&str>) -> AppResult<AiResponse> {
            self.next(session_id)
        }

        async fn process_image(&self, _image: &MediaBlob, session_id: Option<&str>) -> AppResult<AiResponse> {
            self.next(session_id)
        }

        async fn chat_history(&self) -> AppResult<Vec<ChatHistoryItem>> {
            self.history
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn clear_conversation(&self) -> AppResult<()> {
            *self.clears.lock().unwrap() += 1;
            if self.clear_fails {
                Err(AppError::Http { status: 500, message: "HTTP error! status: 500".into(), body: None })
            } else {
                Ok(())
            }
        }

        async fn validate_with_sensors(
            &self,
            _request: &SensorValidationRequest,
        ) -> AppResult<SensorValidationResult> {
            self.sensor
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(AppError::Network("sensor offline".into())))
        }
    }

    fn ok(session: &str) -> AppResult<AiResponse> {
        Ok(AiResponse {
            output: "Estoy aquí para escucharte".into(),
            session_id: session.into(),
            assessment: None,
            risk_level: None,
            depression_classification: None,
        })
    }

    fn high_depression(session: &str) -> AppResult<AiResponse> {
        let mut res = ok(session)?;
        res.risk_level = Some(RiskLevel::High);
        res.assessment = Some(Assessment {
            session_id: session.into(),
            kind: Some(AssessmentType::Depression),
            risk_level: Some(RiskLevel::High),
            timestamp: "2024-05-01T10:00:00".into(),
            text_sample: "me siento muy triste".into(),
            detail: AssessmentDetail::Depression(DepressionAssessment {
                level: "Alto".into(),
                score: 1.0,
                is_depression: true,
                probability_neutral: 0.08,
                probability_depression: 0.92,
                timestamp: String::new(),
                categories: None,
            }),
        });
        Ok(res)
    }

    fn view(stub: Arc<StubGateway>) -> ConversationView {
        ConversationView::new(stub, "https://api.example.com")
    }

    fn clip() -> MediaBlob {
        MediaBlob::new(vec![1, 2, 3], "audio/webm", "nota-voz.webm")
    }

    #[tokio::test]
    async fn test_first_text_establishes_session_and_colors_risk() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(high_depression("sess-1"));
        let mut chat = view(stub.clone());
        assert_eq!(chat.session_id(), None);

        chat.submit_text("me siento muy triste").await.unwrap();

        assert_eq!(chat.history().len(), 1);
        assert_eq!(chat.session_id(), Some("sess-1"));
        assert_eq!(stub.sent_sessions.lock().unwrap()[0], None);

        let msg = &chat.history()[0];
        assert_eq!(msg.text(), "me siento muy triste");
        assert_eq!(render::risk_color(msg.risk_level), HIGH_COLOR);

        let views = chat.message_views();
        assert_eq!(views[0].card.as_ref().unwrap().color, HIGH_COLOR);
    }

    #[tokio::test]
    async fn test_session_follows_latest_exchange() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        stub.reply(ok("b"));
        let mut chat = view(stub.clone());

        chat.submit_text("uno").await.unwrap();
        chat.submit_voice(clip()).await.unwrap();

        assert_eq!(chat.session_id(), Some("b"));
        let sent = stub.sent_sessions.lock().unwrap().clone();
        assert_eq!(sent, vec![None, Some("a".to_string())]);
    }

    #[tokio::test]
    async fn test_failed_sends_never_append() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        stub.reply(Err(AppError::Network("offline".into())));
        stub.reply(ok("a"));
        let mut chat = view(stub);

        assert!(chat.submit_text("uno").await.is_ok());
        assert!(chat.submit_text("dos").await.is_err());
        assert_eq!(chat.error(), Some("Network error: offline"));
        assert!(!chat.is_loading());
        assert_eq!(chat.history().len(), 1);

        assert!(chat.submit_image(MediaBlob::new(vec![9], "image/png", "x.png")).await.is_ok());
        assert_eq!(chat.history().len(), 2);
        assert_eq!(chat.error(), None);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_without_request() {
        let stub = Arc::new(StubGateway::default());
        let mut chat = view(stub.clone());
        assert!(matches!(chat.submit_text("   \n").await, Err(AppError::Validation(_))));
        assert!(matches!(
            chat.submit_voice(MediaBlob::new(Vec::new(), "audio/webm", "n.webm")).await,
            Err(AppError::Validation(_))
        ));
        assert!(stub.sent_sessions.lock().unwrap().is_empty());
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_loading_is_busy() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        let mut chat = view(stub.clone());
        chat.loading = true;

        assert!(matches!(chat.submit_text("hola").await, Err(AppError::Busy)));
        assert!(chat.history().is_empty());
        assert!(stub.sent_sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_voice_message_keeps_local_clip() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        let mut chat = view(stub);
        let clip = clip();
        let url = clip.blob_url();

        chat.submit_voice(clip).await.unwrap();
        assert_eq!(chat.message_views()[0].bubble, Bubble::Audio(url));
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        let mut chat = view(stub.clone());
        chat.submit_text("hola").await.unwrap();

        assert!(!chat.confirm_clear().await.unwrap());
        assert_eq!(chat.history().len(), 1);

        chat.request_clear();
        chat.cancel_clear();
        assert!(!chat.confirm_clear().await.unwrap());
        assert_eq!(chat.history().len(), 1);
        assert_eq!(chat.session_id(), Some("a"));
        assert_eq!(*stub.clears.lock().unwrap(), 0);

        chat.request_clear();
        assert!(chat.confirm_clear().await.unwrap());
        assert!(chat.history().is_empty());
        assert_eq!(chat.session_id(), None);
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_history() {
        let stub = Arc::new(StubGateway { clear_fails: true, ..Default::default() });
        stub.reply(ok("a"));
        let mut chat = view(stub);
        chat.submit_text("hola").await.unwrap();

        chat.request_clear();
        assert!(chat.confirm_clear().await.is_err());
        assert_eq!(chat.history().len(), 1);
        assert_eq!(chat.session_id(), Some("a"));
        assert!(chat.error().is_some());
    }

    #[tokio::test]
    async fn test_load_history_preserves_backend_order() {
        let stub = Arc::new(StubGateway::default());
        let items: Vec<ChatHistoryItem> = serde_json::from_value(serde_json::json!([
            {"id": 5, "message": "tarde", "response": "r", "created_at": "2024-05-02T10:00:00"},
            {"id": 3, "message": "temprano", "response": "r", "created_at": "2024-05-01T10:00:00"}
        ]))
        .unwrap();
        *stub.history.lock().unwrap() = Some(Ok(items));
        let mut chat = view(stub);

        chat.load_history().await;
        let ids: Vec<i64> = chat.history().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 3]);
    }

    #[tokio::test]
    async fn test_load_history_failure_degrades_to_empty() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        let mut chat = view(stub.clone());
        chat.submit_text("hola").await.unwrap();

        *stub.history.lock().unwrap() = Some(Err(AppError::Network("down".into())));
        chat.load_history().await;
        assert!(chat.history().is_empty());
        assert_eq!(chat.error(), None);
    }

    #[tokio::test]
    async fn test_load_history_starts_a_fresh_session() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(high_depression("old-session"));
        stub.reply(ok("new-session"));
        let mut chat = view(stub.clone());
        let sent = chat.submit_text("me siento muy triste").await.unwrap();
        chat.toggle_details(sent);
        *stub.sensor.lock().unwrap() = Some(Ok(SensorValidationResult::failed("sin sensor")));
        chat.validate_with_sensors(sent).await.unwrap();

        let items: Vec<ChatHistoryItem> = serde_json::from_value(serde_json::json!([
            {"id": 1, "message": "hola", "response": "r", "created_at": "2024-05-01T10:00:00"}
        ]))
        .unwrap();
        *stub.history.lock().unwrap() = Some(Ok(items));
        chat.load_history().await;

        let ids: Vec<i64> = chat.history().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(chat.session_id(), None);
        assert!(!chat.is_expanded(sent));
        assert!(chat.validation(sent).is_none());

        chat.submit_text("otra vez").await.unwrap();
        assert_eq!(stub.sent_sessions.lock().unwrap()[1], None);
        assert_eq!(chat.session_id(), Some("new-session"));
    }

    #[tokio::test]
    async fn test_reset_discards_conversation() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(high_depression("a"));
        let mut chat = view(stub);
        let id = chat.submit_text("uno").await.unwrap();
        chat.toggle_details(id);
        chat.request_clear();

        chat.reset();
        assert!(chat.history().is_empty());
        assert_eq!(chat.session_id(), None);
        assert!(!chat.is_clear_pending());
        assert!(!chat.is_expanded(id));
    }

    #[tokio::test]
    async fn test_message_ids_are_unique() {
        let stub = Arc::new(StubGateway::default());
        for _ in 0..5 {
            stub.reply(ok("a"));
        }
        let mut chat = view(stub);
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(chat.submit_text(&format!("m{i}")).await.unwrap());
        }
        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 5);
    }

    #[tokio::test]
    async fn test_details_toggle_per_message() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(high_depression("a"));
        stub.reply(high_depression("a"));
        let mut chat = view(stub);
        let first = chat.submit_text("uno").await.unwrap();
        let second = chat.submit_text("dos").await.unwrap();

        assert!(chat.toggle_details(first));
        let views = chat.message_views();
        assert!(views[0].card.as_ref().unwrap().detail.is_some());
        assert!(views[1].card.as_ref().unwrap().detail.is_none());
        assert!(!chat.is_expanded(second));
    }

    #[tokio::test]
    async fn test_sensor_validation_records_result() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(high_depression("a"));
        *stub.sensor.lock().unwrap() = Some(Ok(SensorValidationResult {
            success: true,
            message: "Validación completada".into(),
            esp32_response: Some(serde_json::json!({"text": "true"})),
        }));
        let mut chat = view(stub);
        let id = chat.submit_text("me siento muy triste").await.unwrap();

        let result = chat.validate_with_sensors(id).await.unwrap();
        assert!(result.confirmed());
        assert!(!chat.is_validating(id));
        assert!(chat.validation(id).unwrap().success);

        // Second attempt: the stub now fails, which is stored rather than returned.
        let result = chat.validate_with_sensors(id).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Network error: sensor offline");
    }

    #[tokio::test]
    async fn test_sensor_validation_needs_depression_result() {
        let stub = Arc::new(StubGateway::default());
        stub.reply(ok("a"));
        let mut chat = view(stub);
        let id = chat.submit_text("hola").await.unwrap();
        assert!(matches!(chat.validate_with_sensors(id).await, Err(AppError::Validation(_))));
        assert!(matches!(chat.validate_with_sensors(999).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_sensor_request_for_text_assessment() {
        let res = high_depression("a").unwrap();
        let msg = ChatMessage {
            id: 1,
            payload: MessagePayload::Text("triste".into()),
            response: res.output,
            created_at: String::new(),
            assessment: res.assessment,
            risk_level: res.risk_level,
            depression_classification: None,
        };
        let req = sensor_request(&msg).unwrap();
        assert_eq!(req.probability, "92.0");
        assert_eq!(req.level, "Alto");
        assert_eq!(req.input_type, SensorInputType::Text);
    }

    #[test]
    fn test_sensor_request_for_voice_assessment_is_text_typed() {
        let res = high_depression("a").unwrap();
        let msg = ChatMessage {
            id: 2,
            payload: MessagePayload::Audio(MediaRef::Remote("audio/nota.webm".into())),
            response: res.output,
            created_at: String::new(),
            assessment: res.assessment,
            risk_level: res.risk_level,
            depression_classification: None,
        };
        let req = sensor_request(&msg).unwrap();
        assert_eq!(req.input_type, SensorInputType::Text);
        assert_eq!(serde_json::to_value(&req).unwrap()["type"], "text");
    }

    #[test]
    fn test_sensor_request_for_image_classification() {
        let msg = ChatMessage {
            id: 1,
            payload: MessagePayload::Image(MediaRef::Remote("img.png".into())),
            response: String::new(),
            created_at: String::new(),
            assessment: None,
            risk_level: None,
            depression_classification: Some(DepressionClassification {
                is_depression: true,
                confidence: 0.85,
                probability: [0.15, 0.85],
                processed_text: None,
                error: None,
            }),
        };
        let req = sensor_request(&msg).unwrap();
        assert_eq!(req.probability, "85.0");
        assert_eq!(req.level, "Alto");
        assert_eq!(req.input_type, SensorInputType::Image);
    }
}
