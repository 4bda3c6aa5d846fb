pub mod auth_handler;
pub mod client_handler;
pub mod metrics_handler;
pub mod user_handler;
