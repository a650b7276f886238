use reqwest::header::ACCEPT;
use reqwest::{IntoUrl, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::session::AuthSession;

/// HTTP client for the Feel Guard backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: AuthSession,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: AuthSession) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client error: {e}")))?;

        Ok(Self { http, config, session })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Starts a request, attaching the bearer token when one is stored.
    /// A missing token omits the header; the backend decides whether that is fatal.
    pub(crate) fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        let req = self.http.request(method, url).header(ACCEPT, "application/json");
        match self.session.token() {
            Ok(Some(token)) => req.bearer_auth(token),
            Ok(None) => req,
            Err(e) => {
                log::warn!("Sending request without token, storage read failed: {}", e);
                req
            }
        }
    }

    pub(crate) fn endpoint(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, self.config.url(path))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> AppResult<T> {
        let resp = self.send(req).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Read body error: {e}")))?;
        Ok(serde_json::from_str::<T>(&body)?)
    }

    pub(crate) async fn send_empty(&self, req: RequestBuilder) -> AppResult<()> {
        self.send(req).await.map(|_| ())
    }

    async fn send(&self, req: RequestBuilder) -> AppResult<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Network(format!("HTTP request error: {e}")))?;
        check_status(resp).await
    }
}

async fn check_status(resp: Response) -> AppResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().path().to_string();
    let body = resp.text().await.unwrap_or_default();
    log::warn!("Backend returned HTTP {} for {}", status.as_u16(), url);
    Err(error_from_body(status.as_u16(), &body))
}

/// Typed error for a non-2xx response. FastAPI's string `detail` becomes the message.
pub(crate) fn error_from_body(status: u16, body: &str) -> AppError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("detail"))
        .and_then(|d| d.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {status}"));

    AppError::Http {
        status,
        message,
        body: parsed,
    }
}
