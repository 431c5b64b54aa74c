pub mod app;
pub mod attendance;
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod members;
pub mod models;
pub mod payments;
pub mod schedule;
pub mod seed;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod validation;

pub use app::router;
pub use config::{AppConfig, ClientConfig};
pub use state::AppState;
pub use storage::{load_data, persist_data};
