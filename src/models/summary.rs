use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLevelsSummary {
    #[serde(default)]
    pub bajo: u32,
    #[serde(default)]
    pub moderado: u32,
    #[serde(default)]
    pub alto: u32,
    #[serde(default)]
    pub critico: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentTypesSummary {
    #[serde(default)]
    pub depression: u32,
    #[serde(default)]
    pub neutral: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAssessmentSummary {
    pub user_id: i64,
    #[serde(default)]
    pub total_conversations: u32,
    #[serde(default)]
    pub total_assessments: u32,
    #[serde(default)]
    pub period_days: u32,
    #[serde(default)]
    pub risk_levels_summary: RiskLevelsSummary,
    #[serde(default)]
    pub assessment_types_summary: AssessmentTypesSummary,
    #[serde(default)]
    pub average_risk_score: f64,
    #[serde(default)]
    pub most_common_concern: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl UserAssessmentSummary {
    pub fn is_empty(&self) -> bool {
        self.total_conversations == 0 && self.total_assessments == 0
    }
}
