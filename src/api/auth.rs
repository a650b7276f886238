use reqwest::Method;

use crate::api::client::ApiClient;
use crate::config::endpoints;
use crate::error::{AppError, AppResult};
use crate::models::auth::{AuthToken, LoginRequest, RegisterRequest, User};

impl ApiClient {
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<User> {
        log::info!("Registering user account");
        let req = self.endpoint(Method::POST, endpoints::AUTH_REGISTER).json(request);
        self.send_json(req).await
    }

    /// Form-encoded OAuth2 login. The returned token is persisted in the session.
    pub async fn login(&self, request: &LoginRequest) -> AppResult<AuthToken> {
        let req = self.endpoint(Method::POST, endpoints::AUTH_LOGIN).form(request);
        let token: AuthToken = self.send_json(req).await?;
        self.session().store_token(&token.access_token)?;
        log::info!("Login succeeded (token_type={})", token.token_type);
        Ok(token)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.session().clear()
    }

    pub async fn current_user(&self) -> AppResult<User> {
        if !self.session().is_authenticated() {
            return Err(AppError::Unauthorized("No authentication token".into()));
        }
        let req = self.endpoint(Method::GET, endpoints::AUTH_ME);
        self.send_json(req).await
    }

    /// Checks the stored token against `/me`. A rejected token is removed.
    pub async fn validate_token(&self) -> AppResult<bool> {
        match self.current_user().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => {
                log::info!("Stored token rejected, clearing session");
                self.session().clear()?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
