pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod server;
pub mod store;
pub mod ui;
