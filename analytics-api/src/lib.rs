pub mod api;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod router;
