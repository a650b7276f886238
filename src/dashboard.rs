//! Assessment summary for the dashboard route.

use std::sync::Arc;

use crate::api::SummaryGateway;
use crate::chat::render::{self, HIGH_COLOR, LOW_COLOR, NEUTRAL_COLOR};
use crate::error::AppError;
use crate::models::summary::UserAssessmentSummary;

pub const DEPRESSION_TYPE_COLOR: &str = "#2196F3";
const LOAD_ERROR: &str = "Error al cargar el resumen";
pub const NO_DATA: &str = "No hay datos disponibles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Week, Period::Month, Period::Quarter];

    pub fn days(&self) -> u32 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
        }
    }

    pub fn from_days(days: u32) -> Option<Period> {
        Period::ALL.into_iter().find(|p| p.days() == days)
    }

    pub fn label(&self) -> String {
        format!("Últimos {} días", self.days())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Loading,
    Error(String),
    NoData,
    Loaded(UserAssessmentSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub color: &'static str,
    pub count: u32,
    /// Share of all assessments, `0.0..=100.0`.
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCount {
    pub label: String,
    pub color: &'static str,
    pub count: u32,
}

pub fn type_color(kind: &str) -> &'static str {
    match kind {
        "depression" => DEPRESSION_TYPE_COLOR,
        "neutral" => LOW_COLOR,
        _ => NEUTRAL_COLOR,
    }
}

fn share(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(count) / f64::from(total) * 100.0
    }
}

pub fn risk_bars(summary: &UserAssessmentSummary) -> Vec<Bar> {
    let r = &summary.risk_levels_summary;
    [("Bajo", r.bajo), ("Moderado", r.moderado), ("Alto", r.alto), ("Crítico", r.critico)]
        .into_iter()
        .map(|(label, count)| Bar {
            label: label.to_string(),
            color: render::risk_color_for(label),
            count,
            width: share(count, summary.total_assessments),
        })
        .collect()
}

pub fn type_counts(summary: &UserAssessmentSummary) -> Vec<TypeCount> {
    let t = &summary.assessment_types_summary;
    [("depression", "Depresión", t.depression), ("neutral", "Neutral", t.neutral)]
        .into_iter()
        .map(|(kind, label, count)| TypeCount {
            label: label.to_string(),
            color: type_color(kind),
            count,
        })
        .collect()
}

/// Average risk score with one decimal, and the color of its gauge.
pub fn average_score(summary: &UserAssessmentSummary) -> (String, &'static str) {
    (format!("{:.1}", summary.average_risk_score), HIGH_COLOR)
}

pub struct DashboardView {
    gateway: Arc<dyn SummaryGateway>,
    period: Period,
    state: DashboardState,
}

impl DashboardView {
    pub fn new(gateway: Arc<dyn SummaryGateway>) -> Self {
        Self {
            gateway,
            period: Period::default(),
            state: DashboardState::Loading,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn summary(&self) -> Option<&UserAssessmentSummary> {
        match &self.state {
            DashboardState::Loaded(s) => Some(s),
            _ => None,
        }
    }

    /// Fetches the summary for the current period. Also serves as retry.
    pub async fn load(&mut self) -> &DashboardState {
        self.state = DashboardState::Loading;
        let days = self.period.days();
        log::debug!("Loading assessment summary for {} days", days);

        self.state = match self.gateway.assessment_summary(days).await {
            Ok(summary) if summary.is_empty() => DashboardState::NoData,
            Ok(summary) => DashboardState::Loaded(summary),
            Err(e) if e.is_not_found() => DashboardState::NoData,
            Err(e) => {
                log::warn!("Assessment summary failed: {}", e);
                DashboardState::Error(error_text(&e))
            }
        };
        &self.state
    }

    /// Changing the period reloads; selecting the current one does nothing.
    pub async fn set_period(&mut self, period: Period) -> &DashboardState {
        if period != self.period || !matches!(self.state, DashboardState::Loaded(_)) {
            self.period = period;
            self.load().await;
        }
        &self.state
    }
}

fn error_text(e: &AppError) -> String {
    match e {
        AppError::Http { message, .. } if !message.is_empty() => message.clone(),
        AppError::Network(_) => LOAD_ERROR.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::render::{CRITICAL_COLOR, MODERATE_COLOR};
    use crate::error::AppResult;
    use crate::models::summary::{AssessmentTypesSummary, RiskLevelsSummary};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubSummary {
        replies: Mutex<VecDeque<AppResult<UserAssessmentSummary>>>,
        days: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl SummaryGateway for StubSummary {
        async fn assessment_summary(&self, days: u32) -> AppResult<UserAssessmentSummary> {
            self.days.lock().unwrap().push(days);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Network("offline".into())))
        }
    }

    fn summary(total: u32) -> UserAssessmentSummary {
        UserAssessmentSummary {
            user_id: 7,
            total_conversations: 12,
            total_assessments: total,
            period_days: 30,
            risk_levels_summary: RiskLevelsSummary { bajo: 5, moderado: 3, alto: 2, critico: 0 },
            assessment_types_summary: AssessmentTypesSummary { depression: 4, neutral: 6 },
            average_risk_score: 0.42,
            most_common_concern: "depression".into(),
            recommendations: vec!["Habla con alguien de confianza".into()],
        }
    }

    #[test]
    fn test_risk_bar_widths_and_colors() {
        let bars = risk_bars(&summary(10));
        let widths: Vec<f64> = bars.iter().map(|b| b.width).collect();
        assert_eq!(widths, vec![50.0, 30.0, 20.0, 0.0]);
        let colors: Vec<&str> = bars.iter().map(|b| b.color).collect();
        assert_eq!(colors, vec![LOW_COLOR, MODERATE_COLOR, HIGH_COLOR, CRITICAL_COLOR]);
    }

    #[test]
    fn test_zero_total_gives_zero_width() {
        let bars = risk_bars(&summary(0));
        assert!(bars.iter().all(|b| b.width == 0.0));
    }

    #[test]
    fn test_type_colors() {
        let types = type_counts(&summary(10));
        assert_eq!(types[0].color, DEPRESSION_TYPE_COLOR);
        assert_eq!(types[0].label, "Depresión");
        assert_eq!(types[1].color, LOW_COLOR);
        assert_eq!(type_color("stress"), NEUTRAL_COLOR);
        assert_eq!(average_score(&summary(10)).0, "0.4");
    }

    #[tokio::test]
    async fn test_load_states() {
        let stub = Arc::new(StubSummary::default());
        {
            let mut replies = stub.replies.lock().unwrap();
            replies.push_back(Ok(summary(10)));
            let mut empty = summary(0);
            empty.total_conversations = 0;
            replies.push_back(Ok(empty));
            replies.push_back(Err(AppError::Http { status: 404, message: "x".into(), body: None }));
            replies.push_back(Err(AppError::Http {
                status: 500,
                message: "HTTP error! status: 500".into(),
                body: None,
            }));
        }
        let mut dash = DashboardView::new(stub.clone());
        assert_eq!(dash.state(), &DashboardState::Loading);

        assert!(matches!(dash.load().await, DashboardState::Loaded(_)));
        assert_eq!(dash.load().await, &DashboardState::NoData);
        assert_eq!(dash.load().await, &DashboardState::NoData);
        assert_eq!(dash.load().await, &DashboardState::Error("HTTP error! status: 500".into()));
        assert_eq!(dash.load().await, &DashboardState::Error(LOAD_ERROR.into()));
        assert_eq!(*stub.days.lock().unwrap(), vec![30; 5]);
    }

    #[tokio::test]
    async fn test_period_change_reloads() {
        let stub = Arc::new(StubSummary::default());
        stub.replies.lock().unwrap().extend([Ok(summary(10)), Ok(summary(10))]);
        let mut dash = DashboardView::new(stub.clone());

        dash.load().await;
        dash.set_period(Period::Month).await;
        dash.set_period(Period::Week).await;
        assert_eq!(dash.period().days(), 7);
        assert!(dash.summary().is_some());
        assert_eq!(*stub.days.lock().unwrap(), vec![30, 7]);
        assert_eq!(Period::from_days(90), Some(Period::Quarter));
        assert_eq!(Period::from_days(14), None);
    }
}
