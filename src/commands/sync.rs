use crate::commands::Out;
use crate::{App, Result, SyncDirection, SyncOutcome};

pub async fn sync(app: &mut App, direction: SyncDirection) -> Result<Out<SyncOutcome>> {
    let outcome = app.sync(direction).await?;
    let message = match &outcome {
        SyncOutcome::Skipped => {
            "Not logged in, nothing to sync. Run 'fintrack auth login' first.".to_string()
        }
        SyncOutcome::Pulled { backup } => format!(
            "Replaced local data with the Google Drive snapshot. Previous local data was saved to {}",
            backup.display()
        ),
        SyncOutcome::Initialized => {
            "There was no Google Drive snapshot, so one was created from local data".to_string()
        }
        SyncOutcome::Pushed => "Uploaded local data to Google Drive".to_string(),
    };
    Ok(Out::new(message, outcome))
}
