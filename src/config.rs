use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SENSOR_PATH: &str = "/api/ai/validate-depression-esp32";

/// Backend routes consumed by the client.
pub mod endpoints {
    pub const AUTH_REGISTER: &str = "/api/auth/register";
    pub const AUTH_LOGIN: &str = "/api/auth/login";
    pub const AUTH_ME: &str = "/api/auth/me";

    pub const REGISTRO_CREATE: &str = "/registro";
    pub const REGISTRO_BY_EMAIL: &str = "/registro/email";

    pub const AI_PROCESS_TEXT: &str = "/api/ai/process-text";
    pub const AI_PROCESS_VOICE: &str = "/api/ai/process-voice";
    pub const AI_PROCESS_IMAGE: &str = "/api/ai/process-image";
    pub const AI_CHAT_HISTORY: &str = "/api/ai/chat-history";
    pub const AI_CLEAR_CONVERSATION: &str = "/api/ai/clear-conversation";
    pub const AI_ASSESSMENT_SUMMARY: &str = "/api/ai/user-assessment-summary";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Backend origin without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    /// Path (or absolute URL) of the physical-sensor validation service.
    pub sensor_path: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sensor_path: DEFAULT_SENSOR_PATH.into(),
        }
    }

    /// Reads `FEEL_GUARD_API_BASE_URL`, `FEEL_GUARD_TIMEOUT_SECS` and
    /// `FEEL_GUARD_SENSOR_PATH`, falling back to defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("FEEL_GUARD_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url);

        if let Ok(raw) = std::env::var("FEEL_GUARD_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => log::warn!("Ignoring invalid FEEL_GUARD_TIMEOUT_SECS={}", raw),
            }
        }
        if let Ok(path) = std::env::var("FEEL_GUARD_SENSOR_PATH") {
            if !path.trim().is_empty() {
                config.sensor_path = path.trim().to_string();
            }
        }

        log::debug!("API config loaded: base_url={}", config.base_url);
        config
    }

    /// Absolute URL for a backend path. Absolute inputs are returned as-is.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn sensor_url(&self) -> String {
        self.url(&self.sensor_path)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn normalize_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}
