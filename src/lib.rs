mod advisor;
mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod controller;
mod db;
mod error;
mod mcp;
pub mod model;
mod repo;
mod session;
mod store;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use controller::{App, NewTransaction, ProjectView, SyncDirection, SyncOutcome};
pub use error::{Error, ErrorType, Result};
pub use session::SessionStatus;
