//! Command handlers for the fintrack CLI.
//!
//! Each handler returns an `Out` so that the CLI and the MCP tools present the same results.

mod advice;
mod auth;
mod category;
mod init;
mod mcp;
mod project;
mod sync;
mod transaction;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use advice::{analyze, suggest, summary};
pub use auth::{login, logout, status, Status};
pub use category::{
    add_category, delete_category, list_categories, replace_categories,
    replace_categories_from_file,
};
pub use init::init;
pub use mcp::mcp;
pub use project::{create_project, list_projects};
pub use sync::sync;
pub use transaction::{add_transaction, delete_transaction, list_transactions};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and MCP server interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}
