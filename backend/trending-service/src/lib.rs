pub mod cache;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;

pub use cache::TrendingCache;
pub use config::Config;
pub use error::{AppError, Result};
pub use services::SettingsCache;
