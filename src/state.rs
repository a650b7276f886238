use std::sync::Arc;

use crate::api::ApiClient;
use crate::chat::ConversationView;
use crate::config::ApiConfig;
use crate::dashboard::DashboardView;
use crate::db::Db;
use crate::error::AppResult;
use crate::registration::RegistrationForm;
use crate::routes::{self, Navigation, Route};
use crate::session::AuthSession;

pub struct AppState {
    /// SQLite database connection
    pub db: Db,
    pub session: AuthSession,
    /// Backend client shared by every view model
    pub api: Arc<ApiClient>,
    pub chat: ConversationView,
    pub dashboard: DashboardView,
    pub registration: RegistrationForm,
    /// Route currently rendered
    pub route: Route,
}

impl AppState {
    pub fn new(db: Db, config: ApiConfig) -> AppResult<Self> {
        let session = AuthSession::new(db.clone());
        let media_base = config.base_url.clone();
        let api = Arc::new(ApiClient::new(config, session.clone())?);

        Ok(Self {
            chat: ConversationView::new(api.clone(), media_base),
            dashboard: DashboardView::new(api.clone()),
            registration: RegistrationForm::new(api.clone(), session.clone()),
            db,
            session,
            api,
            route: Route::Home,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Moves to `route` through the auth guard and loads what the target shows.
    pub async fn navigate(&mut self, route: Route) -> Navigation {
        let nav = routes::guard(route, &self.session);
        let target = nav.route();
        if target != self.route {
            log::info!("Navigating to {}", target.path());
            if self.route == Route::AiChat {
                self.chat.reset();
            }
        }
        self.route = target;

        match target {
            Route::AiChat => self.chat.load_history().await,
            Route::Dashboard => {
                self.dashboard.load().await;
            }
            Route::Home => {}
        }
        nav
    }

    /// Drops the token and every view model holding per-user data.
    pub fn logout(&mut self) -> AppResult<()> {
        self.api.logout()?;
        self.chat = ConversationView::new(self.api.clone(), self.api.config().base_url.clone());
        self.dashboard = DashboardView::new(self.api.clone());
        self.route = Route::Home;
        Ok(())
    }
}
