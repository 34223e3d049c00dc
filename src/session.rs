//! Authentication state shared by the API client, the stores and the views.
//!
//! A [`Session`] is constructed once at startup over a [`TokenStore`] and
//! handed to everything that needs it. Logging out or expiring bumps a
//! generation counter; requests started under an older generation are
//! discarded when their response arrives (see [`Ticket`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::routes::Route;
use crate::storage::{self, ACCESS_TOKEN, REFRESH_TOKEN, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated,
    /// A request came back 401. Treated as anonymous until the next login.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub authenticated: bool,
    pub loading: bool,
    pub auth: AuthState,
    pub route: Route,
}

/// Session generation captured when a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

struct Inner {
    store: Box<dyn TokenStore>,
    state: SessionState,
    generation: u64,
}

impl Inner {
    fn clear(&mut self) -> Result<(), ApiError> {
        let access = self.store.remove(ACCESS_TOKEN);
        let refresh = self.store.remove(REFRESH_TOKEN);
        self.state.token = None;
        self.state.authenticated = false;
        self.state.route = Route::Login;
        self.generation += 1;
        access.and(refresh)
    }
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    /// Creates the session in its loading state without reading storage.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        let state = SessionState {
            token: None,
            authenticated: false,
            loading: true,
            auth: AuthState::Anonymous,
            route: Route::Landing,
        };
        Self { inner: Arc::new(Mutex::new(Inner { store: Box::new(store), state, generation: 0 })) }
    }

    /// Creates the session and runs [`Session::check_auth`] once.
    pub fn init(store: impl TokenStore + 'static) -> Self {
        let session = Self::new(store);
        session.check_auth();
        session
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().state.authenticated
    }

    /// Access token as currently stored, or `None` for missing/sentinel values.
    pub fn access_token(&self) -> Option<String> {
        storage::usable(self.lock().store.get(ACCESS_TOKEN))
    }

    pub fn refresh_token(&self) -> Option<String> {
        storage::usable(self.lock().store.get(REFRESH_TOKEN))
    }

    /// Reads storage and derives the authenticated flag from it.
    pub fn check_auth(&self) -> bool {
        let mut inner = self.lock();
        let token = storage::usable(inner.store.get(ACCESS_TOKEN));
        let authenticated = token.is_some();
        debug!(authenticated, "checked stored session");

        inner.state.token = token;
        inner.state.authenticated = authenticated;
        inner.state.loading = false;
        inner.state.auth =
            if authenticated { AuthState::Authenticated } else { AuthState::Anonymous };
        authenticated
    }

    /// Persists the tokens and marks the session authenticated.
    ///
    /// A missing access token is logged and ignored; the state is left as is.
    pub fn login(&self, access: Option<&str>, refresh: Option<&str>) -> Result<(), ApiError> {
        let Some(access) = access.filter(|t| storage::is_usable(t)) else {
            warn!("login called without an access token, session unchanged");
            return Ok(());
        };

        let refresh = refresh.filter(|t| storage::is_usable(t));
        let mut inner = self.lock();
        inner.store.set(ACCESS_TOKEN, access)?;
        match refresh {
            Some(refresh) => inner.store.set(REFRESH_TOKEN, refresh)?,
            None => inner.store.remove(REFRESH_TOKEN)?,
        }

        inner.state.token = Some(access.to_string());
        inner.state.authenticated = true;
        inner.state.loading = false;
        inner.state.auth = AuthState::Authenticated;
        info!(refresh = refresh.is_some(), "logged in");
        Ok(())
    }

    /// Clears both tokens and navigates to the login view.
    pub fn logout(&self) -> Result<(), ApiError> {
        let mut inner = self.lock();
        inner.state.auth = AuthState::Anonymous;
        info!("logged out");
        inner.clear()
    }

    /// Response-guard transition after a 401.
    pub fn expire(&self) {
        let mut inner = self.lock();
        inner.state.auth = AuthState::Expired;
        if let Err(e) = inner.clear() {
            warn!(error = %e, "could not clear stored tokens after 401");
        }
        warn!("session expired, credentials cleared");
    }

    pub fn begin_authentication(&self) {
        self.lock().state.auth = AuthState::Authenticating;
    }

    pub fn authentication_failed(&self) {
        let mut inner = self.lock();
        if inner.state.auth == AuthState::Authenticating {
            inner.state.auth = AuthState::Anonymous;
        }
    }

    /// Probes `/user/profile`. Only a 401 counts as invalid; other failures
    /// (network included) keep the session.
    pub fn verify_token(&self, api: &ApiClient) -> bool {
        if self.access_token().is_none() {
            debug!("no token to verify");
            self.logout_quietly();
            return false;
        }

        match api.probe("/user/profile") {
            Ok(()) => true,
            Err(ApiError::Unauthorized) => {
                self.logout_quietly();
                false
            }
            Err(e) => {
                warn!(error = %e, "token verification inconclusive, keeping session");
                true
            }
        }
    }

    fn logout_quietly(&self) {
        if let Err(e) = self.logout() {
            warn!(error = %e, "logout could not clear stored tokens");
        }
    }

    /// Moves to `route`, applying the login gate. Returns where we landed.
    pub fn navigate(&self, route: Route) -> Route {
        let mut inner = self.lock();
        let landed = route.resolve(inner.state.authenticated);
        if landed != route {
            debug!(from = %route, to = %landed, "redirected by login gate");
        }
        inner.state.route = landed;
        landed
    }

    pub fn current_route(&self) -> Route {
        self.lock().state.route
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.lock().generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().generation == ticket.0
    }
}
