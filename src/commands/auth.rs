//! Authentication command handlers.
//!
//! - `fintrack auth login` runs the consent flow and then pulls
//! - `fintrack auth logout` revokes the grant and forgets the token
//! - `fintrack auth status` reports the session without touching the network

use crate::commands::Out;
use crate::session::SessionStatus;
use crate::{App, Result, SyncOutcome};
use serde::Serialize;

/// This is the only command that opens a browser. After consent, the Drive snapshot replaces local
/// data, or local data is uploaded when there is no snapshot yet.
pub async fn login(app: &mut App) -> Result<Out<SyncOutcome>> {
    let outcome = app.login().await?;
    let message = match &outcome {
        SyncOutcome::Pulled { backup } => format!(
            "Logged in and loaded your data from Google Drive. Previous local data was saved to {}",
            backup.display()
        ),
        SyncOutcome::Initialized => {
            "Logged in and uploaded your local data to Google Drive".to_string()
        }
        SyncOutcome::Skipped | SyncOutcome::Pushed => "Logged in".to_string(),
    };
    Ok(Out::new(message, outcome))
}

pub async fn logout(app: &mut App) -> Result<Out<()>> {
    app.logout().await?;
    Ok("Logged out. Your local data is kept.".into())
}

/// The session and configuration state reported by `fintrack auth status`.
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct Status {
    pub session: SessionStatus,
    pub advisor_configured: bool,
    pub projects: usize,
    /// The most recent background sync failure, if any.
    pub last_error: Option<String>,
}

pub async fn status(app: &App) -> Result<Out<Status>> {
    let status = Status {
        session: app.status(),
        advisor_configured: app.advisor_configured(),
        projects: app.projects().len(),
        last_error: app.last_error().map(str::to_string),
    };
    let message = match status.session {
        SessionStatus::Unconfigured => {
            "Google Drive sync is not configured. Run 'fintrack init' with --client-secret."
        }
        SessionStatus::LoggedOut => "Not logged in. Run 'fintrack auth login'.",
        SessionStatus::LoggedIn => "Logged in to Google Drive",
    };
    Ok(Out::new(message, status))
}
