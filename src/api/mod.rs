// API routes and handlers

pub mod admin;
pub mod auth;
pub mod booking;
pub mod content;
pub mod error;
pub mod health;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use state::AppState;
