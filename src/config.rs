//! Configuration file handling for fintrack.
//!
//! The configuration file is stored at `$FINTRACK_HOME/config.json` and contains backup settings,
//! the advisory model and the paths of the OAuth credential files.

use crate::backup::Backup;
use crate::db::Db;
use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "fintrack";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const TEST_REMOTE: &str = ".test_remote";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";
const FINTRACK_SQLITE: &str = "fintrack.sqlite";

/// The advisory model used when `config.json` does not name one.
pub const DEFAULT_ADVISOR_MODEL: &str = "gemini-2.5-flash";

/// The environment variable holding the advisory API key. Advisory features are off without it.
pub const ADVISOR_API_KEY_ENV: &str = "FINTRACK_ADVISOR_API_KEY";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINTRACK_HOME` and from there it loads `$FINTRACK_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
    advisor_api_key: Option<String>,
}

impl Config {
    /// Creates the home directory, its subdirectories, an initial `config.json` and an empty
    /// database. When `secret_file` is given it is copied to `.secrets/client_secret.json`, which
    /// enables sync.
    ///
    /// # Errors
    /// - Returns an error if a database already exists or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, secret_file: Option<&Path>) -> Result<Self> {
        Self::create_inner(dir.into(), secret_file)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, secret_file: Option<&Path>) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the fintrack home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups_dir = root.join(BACKUPS);
        utils::make_dir(&backups_dir).await?;
        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "fintrack is already initialized at '{}'",
                root.display()
            );
        }

        if let Some(secret_file) = secret_file {
            // Validate before copying so that a bad file is not left behind.
            crate::api::SecretFile::load(secret_file).await?;
            let destination = secrets_dir.join(CLIENT_SECRET_JSON);
            utils::copy(secret_file, &destination).await?;
            utils::restrict_permissions(&destination)?;
        }

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(FINTRACK_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            backups: backups_dir,
            secrets: secrets_dir,
            config_path,
            config_file,
            db,
            sqlite_path,
            advisor_api_key: advisor_api_key_from_env(),
        })
    }

    /// This will
    /// - validate that `$FINTRACK_HOME` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and secrets directories exist
    /// - open the database, migrating it if needed
    /// - return the loaded configuration object
    pub async fn load(fintrack_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(fintrack_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The fintrack home is missing, run 'fintrack init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'fintrack init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(FINTRACK_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            db,
            sqlite_path,
            advisor_api_key: advisor_api_key_from_env(),
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// The directory that stands in for Google Drive in test mode.
    pub fn test_remote_dir(&self) -> PathBuf {
        self.root.join(TEST_REMOTE)
    }

    pub fn advisor_model(&self) -> &str {
        self.config_file
            .advisor_model
            .as_deref()
            .unwrap_or(DEFAULT_ADVISOR_MODEL)
    }

    pub(crate) fn advisor_api_key(&self) -> Option<&str> {
        self.advisor_api_key.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn set_advisor_api_key(&mut self, key: Option<String>) {
        self.advisor_api_key = key;
    }

    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise resolves the relative
    /// path.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.client_secret_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.token_path())
    }

    /// Sync is available once an OAuth client secret is in place.
    pub fn sync_configured(&self) -> bool {
        self.client_secret_path().is_file()
    }

    fn resolve_secrets_file_path(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

fn advisor_api_key_from_env() -> Option<String> {
    std::env::var(ADVISOR_API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "fintrack",
///   "config_version": 1,
///   "backup_copies": 5,
///   "advisor_model": "gemini-2.5-flash",
///   "client_secret_path": ".secrets/client_secret.json",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "fintrack"
    app_name: String,

    config_version: u8,

    /// Number of pre-pull backup copies to keep
    backup_copies: u32,

    /// The Gemini model used for insights and category suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    advisor_model: Option<String>,

    /// Path to the OAuth 2.0 client credentials file (optional, relative to config.json or
    /// absolute)
    /// Defaults to $FINTRACK_HOME/.secrets/client_secret.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Path to the OAuth token file (optional, relative to config.json or absolute)
    /// Defaults to $FINTRACK_HOME/.secrets/token.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            advisor_model: None,
            client_secret_path: None,
            token_path: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file version {} is newer than this program supports",
            config.config_version
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SECRET: &str = r#"{
        "installed": {
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "shh",
            "redirect_uris": ["http://localhost"],
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token"
        }
    }"#;

    #[tokio::test]
    async fn test_config_create_with_secret() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("fintrack_home");
        let secret_source = dir.path().join("downloaded.json");
        utils::write(&secret_source, SECRET).await.unwrap();

        let config = Config::create(&home_dir, Some(&secret_source))
            .await
            .unwrap();

        assert!(secret_source.is_file());
        let found = utils::read(&config.client_secret_path()).await.unwrap();
        assert_eq!(found, SECRET);
        assert!(config.sync_configured());
        assert!(config.backups().is_dir());
        assert!(config.secrets().is_dir());
        assert!(config.sqlite_path().is_file());
        assert_eq!(config.advisor_model(), DEFAULT_ADVISOR_MODEL);
    }

    #[tokio::test]
    async fn test_config_create_without_secret_then_load() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), None).await.unwrap();
        assert!(!config.sync_configured());

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(loaded.root(), config.root());
        assert_eq!(loaded.backup_copies(), 5);
        assert_eq!(
            loaded.token_path(),
            loaded.root().join(SECRETS).join(TOKEN_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), None).await.unwrap();
        let err = Config::create(dir.path(), None).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_secret() {
        let dir = TempDir::new().unwrap();
        let secret_source = dir.path().join("bad.json");
        utils::write(&secret_source, "{}").await.unwrap();
        let home = dir.path().join("home");
        assert!(Config::create(&home, Some(&secret_source)).await.is_err());
        assert!(!home.join(SECRETS).join(CLIENT_SECRET_JSON).exists());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.app_name, "fintrack");
        assert_eq!(config.backup_copies, 5);
        assert_eq!(
            config.client_secret_path(),
            PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON)
        );
        assert_eq!(config.token_path(), PathBuf::from(SECRETS).join(TOKEN_JSON));
    }

    #[tokio::test]
    async fn test_config_file_load_with_optional_fields() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "fintrack",
            "config_version": 1,
            "backup_copies": 3,
            "advisor_model": "gemini-2.5-pro",
            "token_path": "/elsewhere/token.json"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.backup_copies, 3);
        assert_eq!(config.advisor_model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.token_path(), PathBuf::from("/elsewhere/token.json"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{"app_name": "ledger", "config_version": 1, "backup_copies": 5}"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("client_secret_path"));
        assert!(!json.contains("token_path"));
        assert!(!json.contains("advisor_model"));
    }
}
