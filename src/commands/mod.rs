pub mod auth;
pub mod feed;
pub mod git;
pub mod home;
pub mod repo;

use anyhow::{Result, anyhow, bail};
use vault_client::{ApiClient, ApiError, Route};

/// Enters `route`, failing when the login gate sends us elsewhere.
pub fn enter(api: &ApiClient, route: Route) -> Result<()> {
    let landed = api.session().navigate(route);
    if landed != route {
        bail!("{route} requires a session, run `vault login` first");
    }
    Ok(())
}

/// Turns an action failure into the inline message the user sees.
pub fn fail(err: &ApiError, store_error: Option<&str>) -> anyhow::Error {
    match err {
        ApiError::Unauthorized => anyhow!("session expired, run `vault login` to sign in again"),
        _ => anyhow!(store_error.map_or_else(|| err.user_message(), String::from)),
    }
}

pub fn separator(width: usize) {
    println!("{}", "─".repeat(width));
}
