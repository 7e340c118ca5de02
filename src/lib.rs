pub mod analytics;
pub mod app;
pub mod config;
pub mod dates;
pub mod errors;
pub mod habits;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
pub mod tracker;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use tracker::HabitTracker;
