pub mod engagement_repo;
pub mod feed_repo;
pub mod post_repo;
pub mod settings_repo;
