pub mod agent;
pub mod app;
pub mod event;
pub mod logging;
pub mod server;
pub mod store;
pub mod tui;
pub mod ui;
