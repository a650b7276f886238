//! Terminal commands. Each line typed at the prompt parses into one
//! [`Command`]; handlers live in the per-area modules below.

pub mod auth_commands;
pub mod chat_commands;
pub mod dashboard_commands;

use std::path::PathBuf;

use crate::error::AppResult;
use crate::registration::Field;
use crate::routes::nav_links;
use crate::state::AppState;

pub const HELP: &str = "\
Comandos:
  <texto>                    enviar un mensaje (ruta /ai-chat)
  /go <ruta>                 navegar a /, /ai-chat o /dashboard
  /email <correo>            registro: correo (busca registros previos)
  /nombre|/edad|/sexo <v>    registro: resto de campos
  /enviar                    registro: enviar formulario
  /signup <email> <usuario> <contraseña> <nombre completo>
  /login <usuario> <contraseña>
  /logout                    cerrar sesión (Salir)
  /whoami                    usuario actual
  /record <archivo>          enviar nota de voz desde un archivo de audio
  /image <archivo>           subir una imagen
  /camera <archivo>          capturar una foto desde la cámara de archivo
  /history                   recargar el historial
  /details <id>              mostrar u ocultar detalles de una evaluación
  /validate <id>             validar con sensores físicos
  /clear                     limpiar la conversación (pide confirmación)
  /dashboard [7|30|90]       resumen de evaluaciones
  /help                      esta ayuda
  /quit                      salir";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Go(String),
    Form(Field, String),
    SubmitForm,
    SignUp {
        email: String,
        username: String,
        password: String,
        full_name: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    WhoAmI,
    Record(PathBuf),
    Image(PathBuf),
    Camera(PathBuf),
    History,
    Details(i64),
    Validate(i64),
    Clear,
    Confirm,
    Cancel,
    Dashboard(Option<u32>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quit,
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("Uso: {usage}"))
    } else {
        Ok(arg)
    }
}

fn message_id(arg: &str, usage: &str) -> Result<i64, String> {
    required(arg, usage)?
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("Id de mensaje no válido: {arg}"))
}

/// Parses one input line. Lines not starting with `/` are chat messages.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let cmd = match name {
        "go" => Command::Go(required(arg, "/go <ruta>")?.to_string()),
        "email" => Command::Form(Field::Email, arg.to_string()),
        "nombre" => Command::Form(Field::Nombre, arg.to_string()),
        "edad" => Command::Form(Field::Edad, arg.to_string()),
        "sexo" => Command::Form(Field::Sexo, arg.to_lowercase()),
        "enviar" => Command::SubmitForm,
        "signup" => {
            let usage = "/signup <email> <usuario> <contraseña> <nombre completo>";
            let mut parts = arg.splitn(4, char::is_whitespace);
            let mut next = || parts.next().map(str::trim).filter(|s| !s.is_empty());
            match (next(), next(), next(), next()) {
                (Some(email), Some(username), Some(password), Some(full_name)) => Command::SignUp {
                    email: email.to_string(),
                    username: username.to_string(),
                    password: password.to_string(),
                    full_name: full_name.to_string(),
                },
                _ => return Err(format!("Uso: {usage}")),
            }
        }
        "login" => match arg.split_once(char::is_whitespace) {
            Some((username, password)) if !password.trim().is_empty() => Command::Login {
                username: username.to_string(),
                password: password.trim().to_string(),
            },
            _ => return Err("Uso: /login <usuario> <contraseña>".into()),
        },
        "logout" | "salir" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "record" => Command::Record(PathBuf::from(required(arg, "/record <archivo>")?)),
        "image" => Command::Image(PathBuf::from(required(arg, "/image <archivo>")?)),
        "camera" => Command::Camera(PathBuf::from(required(arg, "/camera <archivo>")?)),
        "history" => Command::History,
        "details" => Command::Details(message_id(arg, "/details <id>")?),
        "validate" => Command::Validate(message_id(arg, "/validate <id>")?),
        "clear" => Command::Clear,
        "yes" | "si" | "sí" => Command::Confirm,
        "no" => Command::Cancel,
        "dashboard" => Command::Dashboard(if arg.is_empty() {
            None
        } else {
            Some(arg.parse().map_err(|_| format!("Período no válido: {arg}"))?)
        }),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Comando desconocido: /{other}. Escribe /help.")),
    };
    Ok(Some(cmd))
}

/// Runs one command. A rejected token logs the user out and returns home.
pub async fn dispatch(state: &mut AppState, cmd: Command) -> AppResult<Outcome> {
    let result = match cmd {
        Command::Quit => return Ok(Outcome::Quit),
        Command::Help => Ok(HELP.to_string()),
        Command::Go(path) => chat_commands::go(state, &path).await,
        Command::Form(field, value) => auth_commands::form_field(state, field, value).await,
        Command::SubmitForm => auth_commands::submit_form(state).await,
        Command::SignUp { email, username, password, full_name } => {
            auth_commands::sign_up(state, email, username, password, full_name).await
        }
        Command::Login { username, password } => auth_commands::login(state, username, password).await,
        Command::Logout => auth_commands::logout(state),
        Command::WhoAmI => auth_commands::who_am_i(state).await,
        Command::Say(text) => chat_commands::say(state, &text).await,
        Command::Record(path) => chat_commands::record(state, path).await,
        Command::Image(path) => chat_commands::image(state, path).await,
        Command::Camera(path) => chat_commands::camera(state, path).await,
        Command::History => chat_commands::history(state).await,
        Command::Details(id) => chat_commands::details(state, id),
        Command::Validate(id) => chat_commands::validate(state, id).await,
        Command::Clear => chat_commands::clear(state),
        Command::Confirm => chat_commands::confirm_clear(state).await,
        Command::Cancel => chat_commands::cancel_clear(state),
        Command::Dashboard(days) => dashboard_commands::show(state, days).await,
    };

    match result {
        Ok(text) => Ok(Outcome::Print(text)),
        Err(e) if e.is_unauthorized() => {
            log::info!("Backend rejected the session, logging out");
            state.logout()?;
            Ok(Outcome::Print(
                "Tu sesión ha expirado. Inicia sesión o regístrate de nuevo.".into(),
            ))
        }
        Err(e) => Err(e),
    }
}

/// Prompt prefix: current route and the nav links it offers.
pub fn prompt(state: &AppState) -> String {
    let links: Vec<&str> = nav_links(state.is_authenticated())
        .iter()
        .map(|l| l.label())
        .collect();
    format!("[{}] {} > ", links.join(" | "), state.route.path())
}
