//! HTTP client wrapper for the Vault API.
//!
//! Every guarded request passes through the [`RequestAuthenticator`] on the
//! way out and the [`ResponseGuard`] on the way back. Auth endpoints use the
//! public variants, which skip both.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use ureq::http::Response;
use ureq::unversioned::multipart::Form;
use ureq::{Agent, Body, RequestBuilder};

use crate::config::{Config, DEFAULT_TIMEOUT_SECS};
use crate::error::{ApiError, ErrorBody};
use crate::session::Session;

enum Payload<'a> {
    Empty,
    Json(serde_json::Value),
    Multipart(Form<'a>),
}

enum Verb<'a> {
    Get,
    Delete,
    Post(Payload<'a>),
}

impl Verb<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Delete => "DELETE",
            Self::Post(_) => "POST",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Guarded,
    Public,
}

/// Attaches the stored bearer token, if any, to outgoing requests.
pub struct RequestAuthenticator {
    session: Session,
}

impl RequestAuthenticator {
    pub fn authorization(&self) -> Option<String> {
        self.session.access_token().map(|token| format!("Bearer {token}"))
    }

    fn apply<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        match self.authorization() {
            Some(value) => request.header("Authorization", &value),
            None => {
                debug!("no usable token, sending request anonymously");
                request
            }
        }
    }
}

/// Expires the session on 401 and types every other failure status.
pub struct ResponseGuard {
    session: Session,
}

impl ResponseGuard {
    pub fn check(&self, response: Response<Body>) -> Result<Response<Body>, ApiError> {
        if response.status().as_u16() == 401 {
            warn!("received 401, expiring session");
            self.session.expire();
            return Err(ApiError::Unauthorized);
        }
        check_status(response)
    }
}

fn check_status(mut response: Response<Body>) -> Result<Response<Body>, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body: ErrorBody = response
        .body_mut()
        .read_to_string()
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();

    debug!(status, %body, "request rejected");
    Err(match status {
        403 => ApiError::Forbidden(body),
        _ => ApiError::Rejected { status, body },
    })
}

fn decode<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T, ApiError> {
    let raw = response.body_mut().read_to_string().map_err(|e| ApiError::Decode(e.to_string()))?;
    let raw = if raw.trim().is_empty() { "null" } else { raw.as_str() };
    serde_json::from_str(raw).map_err(|e| ApiError::Decode(e.to_string()))
}

pub struct ApiClient {
    agent: Agent,
    base_url: String,
    session: Session,
    authenticator: RequestAuthenticator,
    guard: ResponseGuard,
}

impl ApiClient {
    pub fn new(config: &Config, session: Session) -> Self {
        Self::build(&config.api_url, config.timeout, session)
    }

    pub fn with_base_url(base_url: &str, session: Session) -> Self {
        Self::build(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS), session)
    }

    fn build(base_url: &str, timeout: Duration, session: Session) -> Self {
        let agent = Agent::new_with_config(
            ureq::config::Config::builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build(),
        );

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            authenticator: RequestAuthenticator { session: session.clone() },
            guard: ResponseGuard { session: session.clone() },
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with(path, &[])
    }

    pub fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        decode(self.execute(Verb::Get, path, query, Access::Guarded)?)
    }

    pub fn get_bytes(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, ApiError> {
        let mut response = self.execute(Verb::Get, path, query, Access::Guarded)?;
        response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    pub fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let json = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        decode(self.execute(Verb::Post(Payload::Json(json)), path, &[], Access::Guarded)?)
    }

    pub fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(self.execute(Verb::Post(Payload::Empty), path, &[], Access::Guarded)?)
    }

    /// Multipart POST; ureq sets the boundary and content type.
    pub fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form<'_>) -> Result<T, ApiError> {
        decode(self.execute(Verb::Post(Payload::Multipart(form)), path, &[], Access::Guarded)?)
    }

    /// POST without a bearer token and without the 401 guard.
    pub fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let json = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        decode(self.execute(Verb::Post(Payload::Json(json)), path, &[], Access::Public)?)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        decode(self.execute(Verb::Delete, path, query, Access::Guarded)?)
    }

    /// Guarded GET whose body is ignored.
    pub fn probe(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Verb::Get, path, &[], Access::Guarded).map(drop)
    }

    fn prepare<B>(
        &self,
        request: RequestBuilder<B>,
        query: &[(&str, &str)],
        access: Access,
    ) -> RequestBuilder<B> {
        let request = query
            .iter()
            .fold(request.header("Accept", "application/json"), |req, (k, v)| req.query(*k, *v));
        match access {
            Access::Guarded => self.authenticator.apply(request),
            Access::Public => request,
        }
    }

    fn execute(
        &self,
        verb: Verb<'_>,
        path: &str,
        query: &[(&str, &str)],
        access: Access,
    ) -> Result<Response<Body>, ApiError> {
        let url = self.url(path);
        let method = verb.name();
        let ticket = self.session.ticket();
        debug!(method, %url, "sending request");

        let sent = match verb {
            Verb::Get => self.prepare(self.agent.get(&url), query, access).call(),
            Verb::Delete => self.prepare(self.agent.delete(&url), query, access).call(),
            Verb::Post(Payload::Empty) => {
                self.prepare(self.agent.post(&url), query, access).send_empty()
            }
            Verb::Post(Payload::Json(body)) => {
                self.prepare(self.agent.post(&url), query, access).send_json(&body)
            }
            Verb::Post(Payload::Multipart(form)) => {
                self.prepare(self.agent.post(&url), query, access).send(form)
            }
        };

        let response = sent.map_err(|e| {
            warn!(method, %url, error = %e, "request failed before a response arrived");
            ApiError::Transport(e.to_string())
        })?;

        if access == Access::Guarded && !self.session.is_current(ticket) {
            debug!(method, %url, "discarding response that outlived its session");
            return Err(ApiError::Cancelled);
        }

        debug!(method, %url, status = response.status().as_u16(), "response received");
        match access {
            Access::Guarded => self.guard.check(response),
            Access::Public => check_status(response),
        }
    }
}
