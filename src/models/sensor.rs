use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorInputType {
    Text,
    Voice,
    Image,
}

/// Depression result forwarded to the physical sensor for confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorValidationRequest {
    /// Depression probability as a percentage with one decimal, e.g. `"87.5"`.
    pub probability: String,
    pub level: String,
    pub confidence: f64,
    #[serde(rename = "type")]
    pub input_type: SensorInputType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorValidationResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esp32_response: Option<serde_json::Value>,
}

impl SensorValidationResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            esp32_response: None,
        }
    }

    /// The sensor answers `{"text": "true"}` when it confirms the result.
    pub fn confirmed(&self) -> bool {
        self.success
            && self
                .esp32_response
                .as_ref()
                .and_then(|r| r.get("text"))
                .and_then(|t| t.as_str())
                == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let req = SensorValidationRequest {
            probability: "87.5".into(),
            level: "Alto".into(),
            confidence: 0.9,
            input_type: SensorInputType::Image,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"probability": "87.5", "level": "Alto", "confidence": 0.9, "type": "image"})
        );
    }

    #[test]
    fn test_confirmation_requires_success_and_true_text() {
        let ok: SensorValidationResult = serde_json::from_value(json!({
            "success": true, "message": "Validado", "esp32_response": {"text": "true"}
        }))
        .unwrap();
        assert!(ok.confirmed());

        let negative: SensorValidationResult = serde_json::from_value(json!({
            "success": true, "message": "Validado", "esp32_response": {"text": "false"}
        }))
        .unwrap();
        assert!(!negative.confirmed());

        assert!(!SensorValidationResult::failed("timeout").confirmed());
    }
}
