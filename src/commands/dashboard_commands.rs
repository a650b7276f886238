use std::fmt::Write as _;

use crate::dashboard::{self, DashboardState, Period, NO_DATA};
use crate::error::{AppError, AppResult};
use crate::routes::{Navigation, Route};
use crate::state::AppState;

const BAR_WIDTH: f64 = 20.0;

pub async fn show(state: &mut AppState, days: Option<u32>) -> AppResult<String> {
    let period = match days {
        Some(d) => Some(
            Period::from_days(d)
                .ok_or_else(|| AppError::Validation(format!("Período no soportado: {d} (7, 30 o 90)")))?,
        ),
        None => None,
    };

    if state.route != Route::Dashboard {
        if let Navigation::Redirect(_) = state.navigate(Route::Dashboard).await {
            return Ok("Inicia sesión para ver el dashboard.".into());
        }
        if let Some(p) = period {
            state.dashboard.set_period(p).await;
        }
    } else {
        match period {
            Some(p) => {
                state.dashboard.set_period(p).await;
            }
            None => {
                state.dashboard.load().await;
            }
        }
    }
    Ok(render(state))
}

pub fn render(state: &AppState) -> String {
    let view = &state.dashboard;
    let summary = match view.state() {
        DashboardState::Loading => return "Cargando resumen...".into(),
        DashboardState::Error(msg) => return format!("{msg}\nReintentar: /dashboard"),
        DashboardState::NoData => return NO_DATA.into(),
        DashboardState::Loaded(summary) => summary,
    };

    let mut out = String::new();
    let _ = writeln!(out, "Dashboard de Salud Mental ({})", view.period().label());
    let _ = writeln!(
        out,
        "  Conversaciones: {}  Evaluaciones: {}  Días: {}",
        summary.total_conversations, summary.total_assessments, summary.period_days
    );

    let _ = writeln!(out, "Niveles de Riesgo");
    for bar in dashboard::risk_bars(summary) {
        let filled = (bar.width / 100.0 * BAR_WIDTH).round() as usize;
        let _ = writeln!(
            out,
            "  {:<9} {:<20} {:>3} {}",
            bar.label,
            "#".repeat(filled),
            bar.count,
            bar.color
        );
    }

    let _ = writeln!(out, "Tipos de Evaluación");
    for t in dashboard::type_counts(summary) {
        let _ = writeln!(out, "  {:<9} {:>3} {}", t.label, t.count, t.color);
    }

    let (score, _) = dashboard::average_score(summary);
    let _ = writeln!(out, "Puntuación Promedio de Riesgo: {score}");
    if !summary.most_common_concern.is_empty() {
        let _ = writeln!(out, "Preocupación principal: {}", summary.most_common_concern);
    }

    if !summary.recommendations.is_empty() {
        let _ = writeln!(out, "Recomendaciones");
        for rec in &summary.recommendations {
            let _ = writeln!(out, "  • {rec}");
        }
    }
    out.trim_end().to_string()
}
