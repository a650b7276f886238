use serde::{Deserialize, Serialize};

use crate::models::assessment::{lenient_risk_level, Assessment, DepressionClassification, RiskLevel};

#[derive(Debug, Clone, Serialize)]
pub struct ProcessTextRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Reply shared by the text, voice and image endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub output: String,
    pub session_id: String,
    #[serde(default)]
    pub assessment: Option<Assessment>,
    #[serde(default, deserialize_with = "lenient_risk_level")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub depression_classification: Option<DepressionClassification>,
}
