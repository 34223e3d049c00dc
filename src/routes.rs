use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Dashboard,
    GitRepositoryManager,
}

impl Route {
    pub const ALL: [Self; 5] =
        [Self::Landing, Self::Login, Self::Signup, Self::Dashboard, Self::GitRepositoryManager];

    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
            Self::GitRepositoryManager => "/git-repository-manager",
        }
    }

    pub fn requires_auth(self) -> bool {
        matches!(self, Self::Dashboard | Self::GitRepositoryManager)
    }

    /// Login gate: anonymous visitors of a protected route land on `/login`.
    pub fn resolve(self, authenticated: bool) -> Self {
        if self.requires_auth() && !authenticated { Self::Login } else { self }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL
            .into_iter()
            .find(|r| r.path() == path)
            .ok_or_else(|| ApiError::Validation(format!("unknown route: {s}")))
    }
}
