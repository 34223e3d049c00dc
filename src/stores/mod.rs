//! Per-resource data stores mirroring the latest server response.

mod git;
mod repository;

pub use git::GitStore;
pub use repository::RepositoryStore;

use tracing::warn;

use crate::error::ApiError;

/// Records a failed call in the store's error slot and hands the result back.
fn record<T>(
    error: &mut Option<String>,
    result: Result<T, ApiError>,
    default: &str,
) -> Result<T, ApiError> {
    if let Err(e) = &result {
        warn!(error = %e, "{default}");
        *error = Some(e.message_or(default));
    }
    result
}
