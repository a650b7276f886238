use async_trait::async_trait;
use reqwest::{Method, Url};

use crate::api::client::ApiClient;
use crate::api::RegistroGateway;
use crate::config::endpoints;
use crate::error::{AppError, AppResult};
use crate::models::registro::{Registro, RegistroCreate, RegistroResponse};

impl ApiClient {
    /// `/registro/email/{email}` with the email percent-encoded as one path segment.
    pub(crate) fn registro_email_url(&self, email: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.config().url(endpoints::REGISTRO_BY_EMAIL))
            .map_err(|e| AppError::Internal(format!("Invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Backend URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(email);
        Ok(url)
    }
}

#[async_trait]
impl RegistroGateway for ApiClient {
    async fn submit_registro(&self, registro: &RegistroCreate) -> AppResult<RegistroResponse> {
        log::info!("Submitting registro form");
        let req = self.endpoint(Method::POST, endpoints::REGISTRO_CREATE).json(registro);
        self.send_json(req).await
    }

    async fn registro_by_email(&self, email: &str) -> AppResult<Registro> {
        let url = self.registro_email_url(email)?;
        let req = self.request(Method::GET, url);
        self.send_json(req).await
    }
}
