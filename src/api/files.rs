//! Serialization and deserialization structures for Google OAuth credential files.
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: the access and refresh tokens we received from Google

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// This redirect needs to be present in the OAuth credential file, or else OAuth will not work.
const REDIRECT: &str = "http://localhost";

/// Holds the `path` of a JSON file together with its deserialized `data` so that the data can be
/// changed in memory and written back to the same place.
#[derive(Default, Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    pub(super) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Writes the data as pretty JSON, readable only by the owner.
    pub(super) async fn save(&self) -> Res<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;
        utils::restrict_permissions(&self.path)
    }

    pub(super) fn data(&self) -> &F {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

/// Represents the structure of the `client_secret.json` file downloaded from Google Cloud Console.
///
/// This file contains OAuth 2.0 Desktop Application credentials. The standard format from Google
/// has an "installed" wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct SecretFile {
    installed: InstalledCredentials,
}

impl SecretFile {
    pub(crate) async fn load(path: &Path) -> Res<SecretFile> {
        utils::deserialize(path)
            .await
            .context("Unable to read the OAuth client secret file")
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn auth_uri(&self) -> &str {
        &self.installed.auth_uri
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// The actual OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    /// Must contain "http://localhost" (without a port number).
    redirect_uris: RedirectUris,
    auth_uri: String,
    token_uri: String,
}

#[derive(Default, Debug, Clone)]
struct RedirectUris(Vec<String>);

impl Serialize for RedirectUris {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RedirectUris {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<String>::deserialize(deserializer)?;
        if !vec.iter().any(|s| is_valid_redirect(s)) {
            return Err(D::Error::custom(format!(
                "At least one of the redirects needs to be {REDIRECT}, but this was not found. \
                When creating the OAuth client for fintrack, you must include '{REDIRECT}'"
            )));
        }
        Ok(RedirectUris(vec))
    }
}

fn is_valid_redirect(s: &str) -> bool {
    s == REDIRECT || s == "http://127.0.0.1"
}

/// This is how we save the token information that we receive from Google OAuth.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct TokenFile {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenFile {
    pub(super) async fn load(p: impl AsRef<Path>) -> Res<Self> {
        let token_file: Self = utils::deserialize(p.as_ref())
            .await
            .context("Unable to deserialize the token JSON file")?;
        token_file.validate_scopes()?;
        Ok(token_file)
    }

    fn validate_scopes(&self) -> Res<()> {
        let found_scopes: HashSet<&str> = self.scopes.iter().map(|s| s.as_str()).collect();
        for &required_scope in OAUTH_SCOPES {
            if !found_scopes.contains(required_scope) {
                bail!("OAuth scope '{required_scope}' is missing, run 'fintrack auth login' again");
            }
        }
        Ok(())
    }

    pub(super) fn new(
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scopes: OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub(super) fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the token is expired or will expire soon (within 5 minutes)
    pub(super) fn is_expired(&self) -> bool {
        let now = Utc::now();
        let buffer = chrono::Duration::minutes(5);
        self.expires_at <= now + buffer
    }

    pub(super) fn update(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(rt) = refresh_token {
            self.refresh_token = rt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_secret(redirects: &str) -> (TempDir, PathBuf) {
        let json = format!(
            r#"
{{
    "installed": {{
        "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
        "client_secret": "YOUR_CLIENT_SECRET",
        "redirect_uris": {redirects},
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token"
    }}
}}
"#
        );
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("client_secret.json");
        utils::write(&p, json).await.unwrap();
        (dir, p)
    }

    #[tokio::test]
    async fn test_client_secret_good_redirect() {
        let (_dir, p) = write_secret(r#"["http://localhost", "https://example.com:4040/x"]"#).await;
        let secret = SecretFile::load(&p).await.unwrap();
        assert_eq!(secret.token_uri(), "https://oauth2.googleapis.com/token");
    }

    #[tokio::test]
    async fn test_client_secret_loopback_ip_redirect() {
        let (_dir, p) = write_secret(r#"["http://127.0.0.1"]"#).await;
        assert!(SecretFile::load(&p).await.is_ok());
    }

    #[tokio::test]
    async fn test_client_secret_bad_redirect() {
        let (_dir, p) = write_secret(r#"["http://localhost:9900"]"#).await;
        let err = SecretFile::load(&p).await.err().unwrap();
        assert!(format!("{err:?}")
            .contains("At least one of the redirects needs to be http://localhost"));
    }

    #[tokio::test]
    async fn test_token_file_missing_scope() {
        let json = r#"{
            "scopes": ["https://www.googleapis.com/auth/drive.readonly"],
            "access_token": "abc12",
            "refresh_token": "xyz89",
            "expires_at": "2025-01-01T00:00:00Z"
        }"#;
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("token.json");
        utils::write(&p, json).await.unwrap();
        let err = TokenFile::load(&p).await.err().unwrap().to_string();
        assert!(err.contains("https://www.googleapis.com/auth/drive.file"));
    }

    #[tokio::test]
    async fn test_token_file_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("token.json");
        let mut file = File::new(&p, TokenFile::new("a".into(), "r".into(), Utc::now()));
        assert!(file.data().is_expired());
        file.data_mut().update(
            "b".into(),
            Utc::now() + chrono::Duration::hours(1),
            None,
        );
        file.save().await.unwrap();

        let loaded = TokenFile::load(&p).await.unwrap();
        assert_eq!(loaded.access_token(), "b");
        assert_eq!(loaded.refresh_token(), "r");
        assert!(!loaded.is_expired());
    }
}
