use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chat::render::{Bubble, DetailPanel, MessageView};
use crate::chat::view::CLEAR_PROMPT;
use crate::chat::ConversationView;
use crate::error::{AppError, AppResult};
use crate::media::camera::{CameraCapture, CameraState};
use crate::media::file_devices::{FileCamera, FileMicrophone};
use crate::media::voice::{Microphone, VoiceRecorder};
use crate::models::message::MediaBlob;
use crate::routes::{Navigation, Route};
use crate::state::AppState;

const LOGIN_REQUIRED: &str = "Inicia sesión o completa el registro para conversar.";

pub async fn go(state: &mut AppState, path: &str) -> AppResult<String> {
    let route = Route::from_path(path);
    match state.navigate(route).await {
        Navigation::Redirect(_) => Ok(LOGIN_REQUIRED.to_string()),
        Navigation::Render(Route::AiChat) => Ok(render_history(state)),
        Navigation::Render(Route::Dashboard) => Ok(super::dashboard_commands::render(state)),
        Navigation::Render(Route::Home) => Ok("Inicio. Usa /email para registrarte.".into()),
    }
}

/// Enters the chat route when not already there.
async fn ensure_chat(state: &mut AppState) -> AppResult<bool> {
    if state.route == Route::AiChat {
        return Ok(true);
    }
    Ok(matches!(state.navigate(Route::AiChat).await, Navigation::Render(_)))
}

pub async fn say(state: &mut AppState, text: &str) -> AppResult<String> {
    if !ensure_chat(state).await? {
        return Ok(LOGIN_REQUIRED.to_string());
    }
    let id = state.chat.submit_text(text).await?;
    Ok(render_one(state, id))
}

pub async fn record(state: &mut AppState, path: PathBuf) -> AppResult<String> {
    if !ensure_chat(state).await? {
        return Ok(LOGIN_REQUIRED.to_string());
    }
    match send_recording(&mut state.chat, Arc::new(FileMicrophone::new(path))).await? {
        Recording::Sent(id) => Ok(render_one(state, id)),
        Recording::NotSent(reason) => Ok(reason),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Recording {
    Sent(i64),
    NotSent(String),
}

/// Captures one clip from `mic` and sends it. Nothing reaches the chat when
/// the device fails or the clip is empty.
async fn send_recording(chat: &mut ConversationView, mic: Arc<dyn Microphone>) -> AppResult<Recording> {
    let mut recorder = VoiceRecorder::new(mic);
    if let Err(e) = recorder.start().await {
        return Ok(Recording::NotSent(format!("{} ({e})", recorder.error().unwrap_or_default())));
    }
    recorder.stop();
    let Some(clip) = recorder.take_clip() else {
        return Ok(Recording::NotSent("La grabación está vacía.".into()));
    };
    Ok(Recording::Sent(chat.submit_voice(clip).await?))
}

fn image_mime(path: &Path, bytes: &[u8]) -> AppResult<&'static str> {
    let format = image::guess_format(bytes)
        .map_err(|_| AppError::Validation(format!("{} no es una imagen", path.display())))?;
    Ok(format.to_mime_type())
}

pub async fn image(state: &mut AppState, path: PathBuf) -> AppResult<String> {
    if !ensure_chat(state).await? {
        return Ok(LOGIN_REQUIRED.to_string());
    }
    let bytes = tokio::fs::read(&path).await?;
    let mime = image_mime(&path, &bytes)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "imagen".into());

    let id = state.chat.submit_image(MediaBlob::new(bytes, mime, file_name)).await?;
    Ok(render_one(state, id))
}

pub async fn camera(state: &mut AppState, path: PathBuf) -> AppResult<String> {
    if !ensure_chat(state).await? {
        return Ok(LOGIN_REQUIRED.to_string());
    }
    let mut capture = CameraCapture::open(Arc::new(FileCamera::new(path)));
    if let CameraState::Error(msg) = capture.ready().await {
        return Ok(msg);
    }
    let blob = capture.capture()?;
    drop(capture);

    let id = state.chat.submit_image(blob).await?;
    Ok(render_one(state, id))
}

pub async fn history(state: &mut AppState) -> AppResult<String> {
    if !ensure_chat(state).await? {
        return Ok(LOGIN_REQUIRED.to_string());
    }
    state.chat.load_history().await;
    Ok(render_history(state))
}

pub fn details(state: &mut AppState, id: i64) -> AppResult<String> {
    if state.chat.message(id).is_none() {
        return Err(AppError::NotFound(format!("Message {id} not found")));
    }
    state.chat.toggle_details(id);
    Ok(render_one(state, id))
}

pub async fn validate(state: &mut AppState, id: i64) -> AppResult<String> {
    let result = state.chat.validate_with_sensors(id).await?;
    if !result.success {
        return Ok(format!("Error en la validación: {}", result.message));
    }
    Ok(render_one(state, id))
}

pub fn clear(state: &mut AppState) -> AppResult<String> {
    if state.chat.history().is_empty() {
        return Ok("No hay mensajes que limpiar.".into());
    }
    state.chat.request_clear();
    Ok(format!("{CLEAR_PROMPT} (/si o /no)"))
}

pub async fn confirm_clear(state: &mut AppState) -> AppResult<String> {
    if state.chat.confirm_clear().await? {
        Ok("Conversación limpiada.".into())
    } else {
        Ok("Nada que confirmar.".into())
    }
}

pub fn cancel_clear(state: &mut AppState) -> AppResult<String> {
    state.chat.cancel_clear();
    Ok("Limpieza cancelada.".into())
}

fn render_one(state: &AppState, id: i64) -> String {
    state
        .chat
        .message_views()
        .iter()
        .find(|v| v.id == id)
        .map(format_view)
        .unwrap_or_default()
}

fn render_history(state: &AppState) -> String {
    let views = state.chat.message_views();
    if views.is_empty() {
        return "¡Hola! ¿Cómo te sientes hoy?".into();
    }
    views.iter().map(format_view).collect::<Vec<_>>().join("\n")
}

pub fn format_view(view: &MessageView) -> String {
    let mut out = String::new();
    let said = match &view.bubble {
        Bubble::Text(text) => text.clone(),
        Bubble::Audio(url) => format!("[nota de voz] {url}"),
        Bubble::Image(url) => format!("[imagen] {url}"),
    };
    let _ = writeln!(out, "#{} {} Tú: {}", view.id, view.time, said);
    if !view.response.is_empty() {
        let _ = writeln!(out, "  Feel Guard: {}", view.response);
    }

    if let Some(card) = &view.card {
        let _ = write!(out, "  [{}] {}", card.header(), card.color);
        if let Some(ts) = &card.timestamp {
            let _ = write!(out, " {ts}");
        }
        let _ = writeln!(out, "  ({}: /details {})", card.toggle_label(), view.id);

        match &card.detail {
            Some(DetailPanel::Depression { level, score, probability_neutral, probability_depression, note }) => {
                let _ = writeln!(out, "    Nivel: {level}  Puntuación: {score}");
                let _ = writeln!(
                    out,
                    "    Probabilidad neutral: {probability_neutral}  Probabilidad depresión: {probability_depression}"
                );
                let _ = writeln!(out, "    {}", note.text());
            }
            Some(DetailPanel::Categories { title, level, score, rows }) => {
                let _ = writeln!(out, "    {title}: {level} ({score})");
                for (name, count) in rows {
                    let _ = writeln!(out, "      {name}: {count}");
                }
            }
            Some(DetailPanel::Crisis { flags }) => {
                for (label, on) in flags {
                    let _ = writeln!(out, "    {label}: {}", if *on { "Sí" } else { "No" });
                }
            }
            None => {}
        }

        if view.validating {
            let _ = writeln!(out, "    Validando con sensores...");
        } else if card.can_validate && view.sensor.is_none() {
            let _ = writeln!(out, "    Validar con sensores físicos: /validate {}", view.id);
        }
    }

    if let Some(sensor) = &view.sensor {
        let _ = writeln!(out, "    Sensor: {}", sensor.message);
        if let Some(confirmation) = sensor.confirmation {
            let _ = writeln!(out, "    {confirmation}");
        }
    }

    out.trim_end().to_string()
}
