pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod models;
pub mod poll;
pub mod reporting;
pub mod session;
pub mod store;
pub mod stream;
