pub mod analytics;
pub mod fanout;
pub mod feed;
pub mod scoring;
pub mod selector;
pub mod settings;

pub use scoring::{compute_score, run_scoring_pass};
pub use selector::{run_selection_pass, select, Candidate};
pub use settings::SettingsCache;
