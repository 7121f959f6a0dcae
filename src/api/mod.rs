//! Access to the remote copy of the data: the Google Drive implementation, its OAuth plumbing,
//! a directory-backed stand-in for testing, and the `SyncGateway` that the app talks to.

mod drive;
mod files;
mod gateway;
mod oauth;
mod test_drive;

use crate::error::Res;
use async_trait::async_trait;

pub(crate) use drive::GoogleDrive;
pub(crate) use files::SecretFile;
pub(crate) use gateway::{Remote, SyncGateway};
pub(crate) use oauth::TokenProvider;
pub(crate) use test_drive::TestDrive;

/// The only scope we ask for. It grants access to files this app created and nothing else.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/drive.file"];

/// The name of the file holding the synced snapshot in the user's Drive.
pub(crate) const REMOTE_FILE_NAME: &str = "fintrack_pro_data.json";

/// The environment variable that, when set to anything non-empty, puts the program in test mode.
pub const TEST_MODE_ENV: &str = "FINTRACK_IN_TEST_MODE";

/// Selects the remote implementation.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Sync with Google Drive.
    #[default]
    Google,
    /// Sync with a local directory and skip the browser consent flow.
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `FINTRACK_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// A file store addressed by file name and opaque file id.
#[async_trait]
pub(crate) trait RemoteStore {
    /// Returns the id of the first non-trashed file named `name`, if any.
    async fn find_file(&self, name: &str) -> Res<Option<String>>;

    /// Creates a file named `name` holding `content` and returns its id.
    async fn create_file(&self, name: &str, content: &str) -> Res<String>;

    /// Replaces the content of the file `id`.
    async fn update_file(&self, id: &str, content: &str) -> Res<()>;

    /// Returns the content of the file `id`.
    async fn download(&self, id: &str) -> Res<String>;
}
