pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod routes;
pub mod session;
pub mod storage;
pub mod stores;

pub use api::ApiClient;
pub use config::Config;
pub use error::ApiError;
pub use routes::Route;
pub use session::{AuthState, Session};
