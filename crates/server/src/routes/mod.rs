pub mod analytics;
pub mod completions;
pub mod health;
