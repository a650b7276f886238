use std::fmt::Write as _;

use crate::error::AppResult;
use crate::models::auth::{LoginRequest, RegisterRequest};
use crate::registration::{Field, FormErrors, NoticeKind, RegistrationForm, SubmitOutcome, SEXO_OPTIONS};
use crate::routes::Route;
use crate::state::AppState;

/// Edits one registro field. An email edit waits out the lookup so the
/// autofilled form can be shown.
pub async fn form_field(state: &mut AppState, field: Field, value: String) -> AppResult<String> {
    let form = &mut state.registration;
    if !form.set_field(field, value) {
        return Ok("Este campo está bloqueado porque el correo ya está registrado.".into());
    }
    if field == Field::Email {
        form.await_lookup().await;
    }
    if field == Field::Sexo && !SEXO_OPTIONS.contains(&form.data().sexo.as_str()) {
        return Ok(format!("Opciones de sexo: {}", SEXO_OPTIONS.join(", ")));
    }
    Ok(render_form(form))
}

pub async fn submit_form(state: &mut AppState) -> AppResult<String> {
    let outcome = state.registration.submit().await?;
    let mut out = render_form(&state.registration);
    if let SubmitOutcome::Authenticated = outcome {
        state.navigate(Route::AiChat).await;
        out.push_str("\nSesión iniciada. Ya puedes conversar.");
    }
    Ok(out)
}

pub async fn sign_up(
    state: &mut AppState,
    email: String,
    username: String,
    password: String,
    full_name: String,
) -> AppResult<String> {
    let user = state
        .api
        .register(&RegisterRequest { email, username, full_name, password })
        .await?;
    Ok(format!("Cuenta creada para {}. Usa /login para entrar.", user.display_name()))
}

pub async fn login(state: &mut AppState, username: String, password: String) -> AppResult<String> {
    state.api.login(&LoginRequest { username, password }).await?;
    state.navigate(Route::AiChat).await;
    Ok("Sesión iniciada.".into())
}

pub fn logout(state: &mut AppState) -> AppResult<String> {
    state.logout()?;
    Ok("Sesión cerrada.".into())
}

pub async fn who_am_i(state: &mut AppState) -> AppResult<String> {
    if !state.api.validate_token().await? {
        state.logout()?;
        return Ok("No hay una sesión válida.".into());
    }
    let user = state.api.current_user().await?;
    Ok(format!("{} <{}>", user.display_name(), user.email))
}

fn field_line(out: &mut String, label: &str, value: &str, errors: &FormErrors, field: Field, locked: bool) {
    let _ = write!(out, "  {label}: {value}");
    if locked {
        out.push_str(" (bloqueado)");
    }
    if let Some(err) = errors.get(field) {
        let _ = write!(out, "  <- {err}");
    }
    out.push('\n');
}

pub fn render_form(form: &RegistrationForm) -> String {
    let mut out = String::from("Ingresar\n");
    if let Some(notice) = form.notice() {
        let tag = match notice.kind {
            NoticeKind::Success => "OK",
            NoticeKind::Error => "ERROR",
        };
        let _ = writeln!(out, "  [{tag}] {}", notice.text);
    }
    let data = form.data();
    let errors = form.errors();
    field_line(&mut out, "Correo", &data.email, errors, Field::Email, false);
    field_line(&mut out, "Nombre", &data.nombre, errors, Field::Nombre, form.is_read_only(Field::Nombre));
    field_line(&mut out, "Edad", &data.edad, errors, Field::Edad, form.is_read_only(Field::Edad));
    field_line(&mut out, "Sexo", &data.sexo, errors, Field::Sexo, form.is_read_only(Field::Sexo));
    out.trim_end().to_string()
}
