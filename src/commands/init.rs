use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory, its subdirectories, an initial `config.json` and an empty database.
///
/// # Arguments
/// - `fintrack_home` - The directory that will be the root of data directory, e.g. `$HOME/fintrack`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON. When given it is validated
///   and copied into the data directory, which enables Google Drive sync.
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file operation fails.
pub async fn init(fintrack_home: &Path, secret_file: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(fintrack_home, secret_file).await?;
    let sync = if config.sync_configured() {
        "Run 'fintrack auth login' to connect Google Drive."
    } else {
        "Sync is disabled because no --client-secret was given."
    };
    Ok(format!(
        "Created the fintrack directory at {}. {sync}",
        config.root().display()
    )
    .into())
}
