pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod transactions;

pub use app::build_app;
pub use state::AppState;
