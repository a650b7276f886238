//! Display structures for chat messages and their assessments.
//!
//! Everything here is a pure function of the message data.

use crate::models::assessment::{
    Assessment, AssessmentDetail, AssessmentType, CategoryAssessment, DepressionAssessment,
    DepressionClassification, RiskLevel,
};
use crate::models::message::{ChatMessage, MediaRef, MessagePayload};
use crate::models::sensor::SensorValidationResult;

pub const LOW_COLOR: &str = "#4CAF50";
pub const MODERATE_COLOR: &str = "#FF9800";
pub const HIGH_COLOR: &str = "#F44336";
pub const CRITICAL_COLOR: &str = "#9C27B0";
pub const NEUTRAL_COLOR: &str = "#9E9E9E";
pub const IMAGE_LOW_COLOR: &str = "#2196F3";

pub fn risk_color(level: Option<RiskLevel>) -> &'static str {
    match level {
        Some(RiskLevel::Low) => LOW_COLOR,
        Some(RiskLevel::Moderate) => MODERATE_COLOR,
        Some(RiskLevel::High) => HIGH_COLOR,
        Some(RiskLevel::Critical) => CRITICAL_COLOR,
        None => NEUTRAL_COLOR,
    }
}

/// Color for a raw label as sent by the backend, English or Spanish.
pub fn risk_color_for(raw: &str) -> &'static str {
    risk_color(RiskLevel::parse(raw))
}

pub fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Bajo",
        RiskLevel::Moderate => "Moderado",
        RiskLevel::High => "Alto",
        RiskLevel::Critical => "Crítico",
    }
}

pub fn type_label(kind: &AssessmentType) -> &str {
    match kind {
        AssessmentType::Depression => "Depresión",
        AssessmentType::Neutral => "Neutral",
        AssessmentType::Stress => "Estrés",
        AssessmentType::Anxiety => "Ansiedad",
        AssessmentType::Crisis => "Crisis",
        AssessmentType::Other(raw) => raw,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailNote {
    NoSymptoms,
    SignalsDetected,
}

impl DetailNote {
    fn for_score(score: f64) -> Self {
        if score == 0.0 {
            DetailNote::NoSymptoms
        } else {
            DetailNote::SignalsDetected
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            DetailNote::NoSymptoms => "No se detectaron síntomas relevantes de depresión.",
            DetailNote::SignalsDetected => {
                "Se detectaron señales de depresión. Si estos síntomas persisten, considera hablar con un profesional."
            }
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DetailNote::NoSymptoms => LOW_COLOR,
            DetailNote::SignalsDetected => MODERATE_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailPanel {
    Depression {
        level: String,
        score: String,
        probability_neutral: String,
        probability_depression: String,
        note: DetailNote,
    },
    Categories {
        title: &'static str,
        level: String,
        score: String,
        rows: Vec<(String, i64)>,
    },
    Crisis {
        flags: Vec<(&'static str, bool)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentCard {
    pub type_label: String,
    pub risk_label: String,
    pub color: &'static str,
    pub timestamp: Option<String>,
    /// Depression results can be forwarded to the physical sensor.
    pub can_validate: bool,
    pub expanded: bool,
    pub detail: Option<DetailPanel>,
}

impl AssessmentCard {
    pub fn header(&self) -> String {
        format!("{} · {}", self.type_label.to_uppercase(), self.risk_label.to_uppercase())
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.expanded {
            "Ocultar detalles"
        } else {
            "Más detalles"
        }
    }
}

pub fn percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}

fn depression_panel(d: &DepressionAssessment) -> DetailPanel {
    DetailPanel::Depression {
        level: d.level.clone(),
        score: format_score(d.score),
        probability_neutral: percent(d.probability_neutral),
        probability_depression: percent(d.probability_depression),
        note: DetailNote::for_score(d.score),
    }
}

fn category_panel(title: &'static str, c: &CategoryAssessment) -> DetailPanel {
    DetailPanel::Categories {
        title,
        level: c.level.clone(),
        score: format_score(c.score),
        rows: c.categories.iter().map(|(k, v)| (k.clone(), *v)).collect(),
    }
}

fn detail_panel(detail: &AssessmentDetail) -> Option<DetailPanel> {
    match detail {
        AssessmentDetail::Depression(d) => Some(depression_panel(d)),
        AssessmentDetail::Stress(s) => Some(category_panel("Evaluación de Estrés", s)),
        AssessmentDetail::Anxiety(a) => Some(category_panel("Evaluación de Ansiedad", a)),
        AssessmentDetail::Crisis(c) => Some(DetailPanel::Crisis {
            flags: vec![
                ("Ideación suicida", c.suicidal_ideation),
                ("Autolesión", c.self_harm),
                ("Ataque de pánico", c.panic_attack),
            ],
        }),
        AssessmentDetail::None => None,
    }
}

/// Card for a generic assessment. Nothing is shown without a type and risk level.
pub fn assessment_card(assessment: &Assessment, expanded: bool) -> Option<AssessmentCard> {
    let kind = assessment.kind.as_ref()?;
    let level = assessment.risk_level?;

    Some(AssessmentCard {
        type_label: type_label(kind).to_string(),
        risk_label: risk_label(level).to_string(),
        color: risk_color(Some(level)),
        timestamp: format_timestamp(&assessment.timestamp),
        can_validate: *kind == AssessmentType::Depression,
        expanded,
        detail: if expanded { detail_panel(&assessment.detail) } else { None },
    })
}

/// Level label and color derived from an image classifier's confidence.
pub fn image_risk(confidence: f64) -> (&'static str, &'static str) {
    if confidence >= 0.8 {
        ("Alto", HIGH_COLOR)
    } else if confidence >= 0.6 {
        ("Moderado", MODERATE_COLOR)
    } else {
        ("Bajo", IMAGE_LOW_COLOR)
    }
}

/// Card for an image classified as depression; negative results show nothing.
pub fn image_card(classification: &DepressionClassification, expanded: bool) -> Option<AssessmentCard> {
    if !classification.is_depression {
        return None;
    }
    let (level, color) = image_risk(classification.confidence);

    let detail = expanded.then(|| DetailPanel::Depression {
        level: level.to_string(),
        score: format_score(classification.confidence),
        probability_neutral: percent(classification.probability[0]),
        probability_depression: percent(classification.probability[1]),
        note: DetailNote::for_score(classification.confidence),
    });

    Some(AssessmentCard {
        type_label: type_label(&AssessmentType::Depression).to_string(),
        risk_label: level.to_string(),
        color,
        timestamp: None,
        can_validate: true,
        expanded,
        detail,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bubble {
    Text(String),
    Audio(String),
    Image(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorStatus {
    pub success: bool,
    pub message: String,
    pub confirmation: Option<&'static str>,
}

impl SensorStatus {
    pub fn from_result(result: &SensorValidationResult) -> Self {
        let confirmation = result.success.then(|| {
            if result.confirmed() {
                "Depresión confirmada a través de sensor físico"
            } else {
                "Depresión no confirmada a través de sensor físico"
            }
        });
        Self {
            success: result.success,
            message: result.message.clone(),
            confirmation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: i64,
    pub bubble: Bubble,
    pub time: String,
    pub response: String,
    pub card: Option<AssessmentCard>,
    pub validating: bool,
    pub sensor: Option<SensorStatus>,
}

/// Per-message UI state that is not part of the message itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageUiState<'a> {
    pub expanded: bool,
    pub validating: bool,
    pub sensor: Option<&'a SensorValidationResult>,
}

pub fn render_message(msg: &ChatMessage, ui: MessageUiState<'_>, media_base: &str) -> MessageView {
    let bubble = match &msg.payload {
        MessagePayload::Text(t) => Bubble::Text(t.clone()),
        MessagePayload::Audio(r) => Bubble::Audio(resolve_media_url(r, media_base)),
        MessagePayload::Image(r) => Bubble::Image(resolve_media_url(r, media_base)),
    };

    let card = match (&msg.assessment, &msg.payload, &msg.depression_classification) {
        (Some(a), _, _) => assessment_card(a, ui.expanded),
        (None, MessagePayload::Image(_), Some(c)) => image_card(c, ui.expanded),
        _ => None,
    };

    MessageView {
        id: msg.id,
        bubble,
        time: format_time(&msg.created_at),
        response: msg.response.clone(),
        card,
        validating: ui.validating,
        sensor: ui.sensor.map(SensorStatus::from_result),
    }
}

/// `blob:` and absolute URLs pass through; backend paths are joined to the base.
pub fn resolve_media_url(media: &MediaRef, base: &str) -> String {
    match media {
        MediaRef::Local(blob) => blob.blob_url(),
        MediaRef::Remote(path) => {
            if path.starts_with("blob:") || path.starts_with("http://") || path.starts_with("https://") {
                path.clone()
            } else {
                format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
            }
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<chrono::NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&chrono::Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// `HH:MM` for a message bubble; unparseable input is returned unchanged.
pub fn format_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn format_timestamp(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(
        parse_timestamp(raw)
            .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| raw.to_string()),
    )
}
