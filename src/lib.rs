pub mod auth;
pub mod authorization;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;
pub mod validation;

pub use routes::router;
pub use state::AppState;
