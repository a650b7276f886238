use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::assessment::{lenient_risk_level, Assessment, DepressionClassification, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Audio,
    Image,
}

/// Recorded clip or picture held in memory until the backend persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub id: uuid::Uuid,
    pub bytes: Arc<[u8]>,
    pub mime: String,
    pub file_name: String,
}

impl MediaBlob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            bytes: bytes.into(),
            mime: mime.into(),
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Local reference usable for playback before the upload completes.
    pub fn blob_url(&self) -> String {
        format!("blob:{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Path or URL of a file persisted by the backend.
    Remote(String),
    Local(MediaBlob),
}

/// Primary payload of a message; exactly one per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    Text(String),
    Audio(MediaRef),
    Image(MediaRef),
}

impl MessagePayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            MessagePayload::Text(_) => MessageType::Text,
            MessagePayload::Audio(_) => MessageType::Audio,
            MessagePayload::Image(_) => MessageType::Image,
        }
    }
}

/// One exchange in the conversation. Immutable once appended to history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub payload: MessagePayload,
    pub response: String,
    pub created_at: String,
    pub assessment: Option<Assessment>,
    pub risk_level: Option<RiskLevel>,
    pub depression_classification: Option<DepressionClassification>,
}

impl ChatMessage {
    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    /// Typed text, empty for voice and image messages.
    pub fn text(&self) -> &str {
        match &self.payload {
            MessagePayload::Text(t) => t,
            _ => "",
        }
    }
}

/// Wire form of a history entry as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    pub id: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub message_type: Option<MessageType>,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub assessment: Option<Assessment>,
    #[serde(default, deserialize_with = "lenient_risk_level")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub depression_classification: Option<DepressionClassification>,
}

impl From<ChatHistoryItem> for ChatMessage {
    fn from(item: ChatHistoryItem) -> Self {
        let payload = match (item.message_type, item.audio_path, item.image_path) {
            (Some(MessageType::Audio), Some(path), _) if !path.is_empty() => {
                MessagePayload::Audio(MediaRef::Remote(path))
            }
            (Some(MessageType::Image), _, Some(path)) if !path.is_empty() => {
                MessagePayload::Image(MediaRef::Remote(path))
            }
            _ => MessagePayload::Text(item.message),
        };

        Self {
            id: item.id,
            payload,
            response: item.response.unwrap_or_default(),
            created_at: item.created_at,
            assessment: item.assessment,
            risk_level: item.risk_level,
            depression_classification: item.depression_classification,
        }
    }
}
