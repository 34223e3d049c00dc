use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{AuthTokens, SignIn, SignUp};
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    /// `/signup` renders the sign-up form, every other path the sign-in one.
    pub fn for_route(route: Route) -> Self {
        if route == Route::Signup { Self::SignUp } else { Self::SignIn }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::SignIn => "/auth/signin",
            Self::SignUp => "/auth/signup",
        }
    }

    pub fn toggled(self) -> Route {
        match self {
            Self::SignIn => Route::Signup,
            Self::SignUp => Route::Login,
        }
    }
}

/// State of the login/sign-up form.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub loading: bool,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            error: None,
            loading: false,
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        let mut required = vec![("email", &self.email), ("password", &self.password)];
        if self.mode == AuthMode::SignUp {
            required.insert(0, ("first name", &self.first_name));
            required.insert(1, ("last name", &self.last_name));
        }

        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ApiError::Validation(format!("Please enter your {field}"))),
            None => Ok(()),
        }
    }

    /// Submits the form. On success the session holds the new tokens and the
    /// dashboard route is returned.
    pub fn submit(&mut self, api: &ApiClient) -> Result<Route, ApiError> {
        self.error = None;
        if let Err(e) = self.validate() {
            self.error = Some(e.user_message());
            return Err(e);
        }

        let session = api.session();
        session.begin_authentication();
        self.loading = true;
        let result = self.exchange(api);
        self.loading = false;

        match result {
            Ok(tokens) => {
                session.login(Some(&tokens.access_token), tokens.refresh_token.as_deref())?;
                info!(mode = ?self.mode, "authenticated");
                Ok(session.navigate(Route::Dashboard))
            }
            Err(e) => {
                warn!(mode = ?self.mode, error = %e, "authentication failed");
                session.authentication_failed();
                self.error = Some(auth_message(&e));
                Err(e)
            }
        }
    }

    fn exchange(&self, api: &ApiClient) -> Result<AuthTokens, ApiError> {
        let tokens: AuthTokens = match self.mode {
            AuthMode::SignIn => api.post_public(
                self.mode.endpoint(),
                &SignIn { email: &self.email, password: &self.password },
            )?,
            AuthMode::SignUp => api.post_public(
                self.mode.endpoint(),
                &SignUp {
                    first_name: &self.first_name,
                    last_name: &self.last_name,
                    email: &self.email,
                    password: &self.password,
                },
            )?,
        };
        tokens.validate()
    }
}

/// Sign-in failures surface the body's `message`, unlike the data stores.
fn auth_message(err: &ApiError) -> String {
    match err {
        ApiError::Forbidden(_) | ApiError::Validation(_) => err.user_message(),
        _ => err
            .body()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| "Something went wrong".to_string()),
    }
}
