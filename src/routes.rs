//! Route table and the auth guard in front of it.

use crate::session::AuthSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    AiChat,
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Home, Route::AiChat, Route::Dashboard];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::AiChat => "/ai-chat",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Unknown paths fall back to `Home`.
    pub fn from_path(path: &str) -> Route {
        let trimmed = path.trim().trim_end_matches('/');
        Route::ALL
            .into_iter()
            .find(|r| r.path().trim_end_matches('/') == trimmed)
            .unwrap_or(Route::Home)
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Home)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Navigation {
    pub fn route(&self) -> Route {
        match self {
            Navigation::Render(r) | Navigation::Redirect(r) => *r,
        }
    }
}

pub fn guard(route: Route, session: &AuthSession) -> Navigation {
    guard_for(route, session.is_authenticated())
}

pub fn guard_for(route: Route, authenticated: bool) -> Navigation {
    if route.is_protected() && !authenticated {
        log::debug!("Redirecting {} to {}", route.path(), Route::Home.path());
        Navigation::Redirect(Route::Home)
    } else {
        Navigation::Render(route)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLink {
    Inicio,
    Interactuar,
    Salir,
}

impl NavLink {
    pub fn label(&self) -> &'static str {
        match self {
            NavLink::Inicio => "Inicio",
            NavLink::Interactuar => "Interactuar",
            NavLink::Salir => "Salir",
        }
    }

    /// Where the link leads. `Salir` logs out and lands on home.
    pub fn target(&self) -> Route {
        match self {
            NavLink::Inicio | NavLink::Salir => Route::Home,
            NavLink::Interactuar => Route::AiChat,
        }
    }
}

pub fn nav_links(authenticated: bool) -> &'static [NavLink] {
    if authenticated {
        &[NavLink::Interactuar, NavLink::Salir]
    } else {
        &[NavLink::Inicio]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), route);
        }
        assert_eq!(Route::from_path("/ai-chat/"), Route::AiChat);
        assert_eq!(Route::from_path("/nowhere"), Route::Home);
    }

    #[test]
    fn test_protected_routes_redirect_when_logged_out() {
        assert_eq!(guard_for(Route::AiChat, false), Navigation::Redirect(Route::Home));
        assert_eq!(guard_for(Route::Dashboard, false), Navigation::Redirect(Route::Home));
        assert_eq!(guard_for(Route::Home, false), Navigation::Render(Route::Home));
        assert_eq!(guard_for(Route::Dashboard, true), Navigation::Render(Route::Dashboard));
    }

    #[test]
    fn test_guard_reads_stored_token() {
        let session = AuthSession::new(db::memory().unwrap());
        assert_eq!(guard(Route::AiChat, &session).route(), Route::Home);

        session.store_token("tok").unwrap();
        assert_eq!(guard(Route::AiChat, &session), Navigation::Render(Route::AiChat));

        session.clear().unwrap();
        assert_eq!(guard(Route::AiChat, &session), Navigation::Redirect(Route::Home));
    }

    #[test]
    fn test_nav_links_follow_auth() {
        assert_eq!(nav_links(false), &[NavLink::Inicio]);
        assert_eq!(nav_links(true), &[NavLink::Interactuar, NavLink::Salir]);
        assert_eq!(NavLink::Interactuar.target(), Route::AiChat);
    }
}
