//! REST API over users and courses with HTTP Basic authentication and
//! per-field request validation.

pub mod app;
pub mod auth;
pub mod config;
pub mod courses;
pub mod error;
pub mod lenient;
pub mod state;
pub mod store;
pub mod users;
pub mod validation;

pub use app::{build_app, serve};
pub use state::AppState;
