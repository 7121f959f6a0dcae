//! Whether, and how, the app is connected to the remote store.

use crate::api::{GoogleDrive, Mode, SyncGateway, TestDrive, TokenProvider};
use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Config, Result};
use anyhow::anyhow;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The connection state owned by the `App`.
#[derive(Default)]
pub(crate) enum Session {
    /// No OAuth client secret is configured. Sync is disabled.
    #[default]
    Uninitialized,
    /// Sync is configured but nobody is logged in.
    Ready,
    /// Logged in. Mutations are pushed to the remote store.
    Authenticated(Connection),
}

pub(crate) struct Connection {
    gateway: SyncGateway,
    /// `None` in test mode, where there is no grant to revoke.
    tokens: Option<Arc<Mutex<TokenProvider>>>,
}

/// A serializable view of the `Session` state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unconfigured,
    LoggedOut,
    LoggedIn,
}

serde_plain::derive_display_from_serialize!(SessionStatus);

impl Session {
    /// Restores the session from a saved token without user interaction. If the token cannot be
    /// loaded or refreshed the session is left `Ready` and a warning is logged.
    pub(crate) async fn resume(config: &Config, mode: Mode) -> Self {
        if mode == Mode::Google && !config.sync_configured() {
            debug!("No OAuth client secret found, sync is disabled");
            return Session::Uninitialized;
        }
        if !config.token_path().is_file() {
            return Session::Ready;
        }
        match connect(config, mode, false).await {
            Ok(connection) => Session::Authenticated(connection),
            Err(e) => {
                warn!("Unable to restore the previous login, run 'fintrack auth login': {e:#}");
                Session::Ready
            }
        }
    }

    /// Runs the consent flow, or does nothing if already logged in.
    pub(crate) async fn login(&mut self, config: &Config, mode: Mode) -> Result<()> {
        match self {
            Session::Uninitialized => Err(crate::Error::new(
                ErrorType::Auth,
                anyhow!(
                    "Sync is not configured. Run 'fintrack init --client-secret <FILE>' with an \
                    OAuth client secret downloaded from Google Cloud Console"
                ),
            )),
            Session::Authenticated(_) => {
                debug!("Already logged in");
                Ok(())
            }
            Session::Ready => {
                let connection = connect(config, mode, true)
                    .await
                    .pub_result(ErrorType::Auth)?;
                *self = Session::Authenticated(connection);
                Ok(())
            }
        }
    }

    /// Revokes the grant (best effort), deletes the saved token and drops the connection. Calling
    /// this when not logged in is fine.
    pub(crate) async fn logout(&mut self, config: &Config) -> Result<()> {
        if let Session::Authenticated(_) = self {
            if let Session::Authenticated(connection) = std::mem::replace(self, Session::Ready) {
                if let Some(tokens) = connection.tokens {
                    tokens.lock().await.revoke().await;
                }
            }
        }
        let token_path = config.token_path();
        if token_path.is_file() {
            utils::remove(&token_path)
                .await
                .pub_result(ErrorType::Auth)?;
            info!("Removed {}", token_path.display());
        }
        Ok(())
    }

    /// A logged-in session over an arbitrary remote.
    #[cfg(test)]
    pub(crate) fn connected(gateway: SyncGateway) -> Self {
        Session::Authenticated(Connection {
            gateway,
            tokens: None,
        })
    }

    pub(crate) fn gateway(&self) -> Option<&SyncGateway> {
        match self {
            Session::Authenticated(connection) => Some(&connection.gateway),
            _ => None,
        }
    }

    pub(crate) fn status(&self) -> SessionStatus {
        match self {
            Session::Uninitialized => SessionStatus::Unconfigured,
            Session::Ready => SessionStatus::LoggedOut,
            Session::Authenticated(_) => SessionStatus::LoggedIn,
        }
    }
}

async fn connect(config: &Config, mode: Mode, interactive: bool) -> Res<Connection> {
    match mode {
        Mode::Testing => {
            let token_path = config.token_path();
            if interactive {
                utils::write(&token_path, r#"{"test_mode":true}"#).await?;
                utils::restrict_permissions(&token_path)?;
                info!("Logged in to the test remote at {}", config.test_remote_dir().display());
            }
            let drive = TestDrive::new(config.test_remote_dir()).await?;
            Ok(Connection {
                gateway: SyncGateway::new(Arc::new(drive)),
                tokens: None,
            })
        }
        Mode::Google => {
            let secret = config.client_secret_path();
            let token = config.token_path();
            let provider = if interactive {
                TokenProvider::initialize(&secret, &token).await?
            } else {
                TokenProvider::load(&secret, &token).await?
            };
            let drive = GoogleDrive::new(provider);
            let tokens = drive.tokens();
            Ok(Connection {
                gateway: SyncGateway::new(Arc::new(drive)),
                tokens: Some(tokens),
            })
        }
    }
}
