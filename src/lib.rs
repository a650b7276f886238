pub mod api;
pub mod chat;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod registration;
pub mod routes;
pub mod session;
pub mod state;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use commands::Outcome;
use config::ApiConfig;
use state::AppState;

fn init_logging() {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

pub async fn run() -> anyhow::Result<()> {
    init_logging();

    let db = db::open()?;
    let config = ApiConfig::from_env();
    log::info!("Feel Guard client starting against {}", config.base_url);

    let mut state = AppState::new(db, config)?;
    if state.is_authenticated() {
        match state.api.validate_token().await {
            Ok(true) => {
                state.navigate(routes::Route::AiChat).await;
            }
            Ok(false) => log::info!("Stored session expired"),
            Err(e) => log::warn!("Could not validate stored session: {}", e),
        }
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(b"Feel Guard. Escribe /help para ver los comandos.\n")
        .await?;

    loop {
        state.registration.poll_lookup();
        stdout.write_all(commands::prompt(&state).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let cmd = match commands::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(usage) => {
                stdout.write_all(format!("{usage}\n").as_bytes()).await?;
                continue;
            }
        };

        match commands::dispatch(&mut state, cmd).await {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Print(text)) => {
                if !text.is_empty() {
                    stdout.write_all(format!("{text}\n").as_bytes()).await?;
                }
            }
            Err(e) => {
                log::debug!("Command failed: {:?}", e);
                stdout.write_all(format!("Error: {e}\n").as_bytes()).await?;
            }
        }
    }

    log::info!("Feel Guard client exiting");
    Ok(())
}
