use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordinal severity of a detected concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Case-insensitive; accepts the English wire values and the Spanish
    /// labels used by the summary endpoint.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "bajo" => Some(RiskLevel::Low),
            "moderate" | "moderado" => Some(RiskLevel::Moderate),
            "high" | "alto" => Some(RiskLevel::High),
            "critical" | "crítico" | "critico" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RiskLevel::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown risk level: {raw}")))
    }
}

/// Deserializes an optional risk level, mapping unknown or empty strings to `None`.
pub fn lenient_risk_level<'de, D>(deserializer: D) -> Result<Option<RiskLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RiskLevel::parse))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentType {
    Depression,
    Neutral,
    Stress,
    Anxiety,
    Crisis,
    Other(String),
}

impl AssessmentType {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_lowercase().as_str() {
            "depression" => AssessmentType::Depression,
            "neutral" => AssessmentType::Neutral,
            "stress" => AssessmentType::Stress,
            "anxiety" => AssessmentType::Anxiety,
            "crisis" => AssessmentType::Crisis,
            _ => AssessmentType::Other(trimmed.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssessmentType::Depression => "depression",
            AssessmentType::Neutral => "neutral",
            AssessmentType::Stress => "stress",
            AssessmentType::Anxiety => "anxiety",
            AssessmentType::Crisis => "crisis",
            AssessmentType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepressionAssessment {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub is_depression: bool,
    #[serde(default)]
    pub probability_neutral: f64,
    #[serde(default)]
    pub probability_depression: f64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<String, i64>>,
}

/// Keyword-category breakdown used by the stress and anxiety assessments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssessment {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub categories: BTreeMap<String, i64>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisIndicators {
    #[serde(default)]
    pub suicidal_ideation: bool,
    #[serde(default)]
    pub self_harm: bool,
    #[serde(default)]
    pub panic_attack: bool,
}

impl CrisisIndicators {
    pub fn any(&self) -> bool {
        self.suicidal_ideation || self.self_harm || self.panic_attack
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentDetail {
    Depression(DepressionAssessment),
    Stress(CategoryAssessment),
    Anxiety(CategoryAssessment),
    Crisis(CrisisIndicators),
    None,
}

/// Backend judgment attached to one exchange. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AssessmentWire", into = "AssessmentWire")]
pub struct Assessment {
    pub session_id: String,
    pub kind: Option<AssessmentType>,
    pub risk_level: Option<RiskLevel>,
    pub timestamp: String,
    pub text_sample: String,
    pub detail: AssessmentDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AssessmentWire {
    #[serde(default)]
    session_id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    risk_level: Option<String>,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    text_sample: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depression_assessment: Option<DepressionAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stress_assessment: Option<CategoryAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anxiety_assessment: Option<CategoryAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crisis_indicators: Option<CrisisIndicators>,
}

impl From<AssessmentWire> for Assessment {
    fn from(wire: AssessmentWire) -> Self {
        let detail = if let Some(d) = wire.depression_assessment {
            AssessmentDetail::Depression(d)
        } else if let Some(s) = wire.stress_assessment {
            AssessmentDetail::Stress(s)
        } else if let Some(a) = wire.anxiety_assessment {
            AssessmentDetail::Anxiety(a)
        } else if let Some(c) = wire.crisis_indicators {
            AssessmentDetail::Crisis(c)
        } else {
            AssessmentDetail::None
        };

        Self {
            session_id: wire.session_id,
            kind: AssessmentType::parse(&wire.kind),
            risk_level: wire.risk_level.as_deref().and_then(RiskLevel::parse),
            timestamp: wire.timestamp,
            text_sample: wire.text_sample,
            detail,
        }
    }
}

impl From<Assessment> for AssessmentWire {
    fn from(a: Assessment) -> Self {
        let mut wire = AssessmentWire {
            session_id: a.session_id,
            kind: a.kind.as_ref().map(|k| k.as_str().to_string()).unwrap_or_default(),
            risk_level: a.risk_level.map(|r| r.as_str().to_string()),
            timestamp: a.timestamp,
            text_sample: a.text_sample,
            ..Default::default()
        };
        match a.detail {
            AssessmentDetail::Depression(d) => wire.depression_assessment = Some(d),
            AssessmentDetail::Stress(s) => wire.stress_assessment = Some(s),
            AssessmentDetail::Anxiety(x) => wire.anxiety_assessment = Some(x),
            AssessmentDetail::Crisis(c) => wire.crisis_indicators = Some(c),
            AssessmentDetail::None => {}
        }
        wire
    }
}

/// Output of the text/image depression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepressionClassification {
    pub is_depression: bool,
    #[serde(default)]
    pub confidence: f64,
    /// `[neutral, depression]`
    #[serde(default)]
    pub probability: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DepressionClassification {
    pub fn probability_depression(&self) -> f64 {
        self.probability[1]
    }
}
