pub mod chat_completions;
pub mod health;
pub mod metrics_handler;
pub mod models;
