use crate::api::{RemoteStore, REMOTE_FILE_NAME};
use crate::error::{ErrorType, IntoResult};
use crate::model::{AppData, AppDataPatch};
use crate::Result;
use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info};

pub(crate) type Remote = Arc<dyn RemoteStore + Send + Sync>;

/// Moves whole snapshots to and from the single remote file. There is no merging: whichever side
/// wrote last wins.
#[derive(Clone)]
pub(crate) struct SyncGateway {
    remote: Remote,
}

impl SyncGateway {
    pub(crate) fn new(remote: Remote) -> Self {
        Self { remote }
    }

    /// The id of the remote snapshot file. If there are several, the first one listed is used.
    pub(crate) async fn locate(&self) -> Result<Option<String>> {
        self.remote
            .find_file(REMOTE_FILE_NAME)
            .await
            .context("Unable to search for the remote snapshot")
            .pub_result(ErrorType::Sync)
    }

    /// Writes `snapshot` over the remote file, creating it if it does not exist yet.
    pub(crate) async fn push(&self, snapshot: &AppData) -> Result<()> {
        let content = serde_json::to_string(snapshot)
            .context("Unable to serialize the snapshot")
            .pub_result(ErrorType::Internal)?;
        match self.locate().await? {
            Some(id) => {
                debug!("Updating remote snapshot {id}");
                self.remote
                    .update_file(&id, &content)
                    .await
                    .context("Unable to update the remote snapshot")
                    .pub_result(ErrorType::Sync)?;
            }
            None => {
                let id = self
                    .remote
                    .create_file(REMOTE_FILE_NAME, &content)
                    .await
                    .context("Unable to create the remote snapshot")
                    .pub_result(ErrorType::Sync)?;
                info!("Created remote snapshot {id}");
            }
        }
        Ok(())
    }

    /// Downloads the remote snapshot, or returns `None` when there is none.
    pub(crate) async fn pull(&self) -> Result<Option<AppDataPatch>> {
        let Some(id) = self.locate().await? else {
            return Ok(None);
        };
        debug!("Downloading remote snapshot {id}");
        let content = self
            .remote
            .download(&id)
            .await
            .context("Unable to download the remote snapshot")
            .pub_result(ErrorType::Sync)?;
        let patch = serde_json::from_str(&content)
            .context("The remote snapshot is malformed")
            .pub_result(ErrorType::Sync)?;
        Ok(Some(patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestDrive;
    use crate::model::{default_categories, Project};
    use chrono::Utc;
    use tempfile::TempDir;

    async fn gateway(tmp: &TempDir) -> (SyncGateway, Arc<TestDrive>) {
        let drive = Arc::new(TestDrive::new(tmp.path()).await.unwrap());
        (SyncGateway::new(drive.clone()), drive)
    }

    fn data(project: &str) -> AppData {
        AppData {
            projects: vec![Project::new(project, "", None)],
            transactions: Vec::new(),
            categories: default_categories(),
            last_synced: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pull_without_remote() {
        let tmp = TempDir::new().unwrap();
        let (gateway, _) = gateway(&tmp).await;
        assert!(gateway.locate().await.unwrap().is_none());
        assert!(gateway.pull().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_push_creates_then_updates() {
        let tmp = TempDir::new().unwrap();
        let (gateway, drive) = gateway(&tmp).await;
        gateway.push(&data("first")).await.unwrap();
        let id = gateway.locate().await.unwrap().unwrap();
        gateway.push(&data("second")).await.unwrap();
        assert_eq!(gateway.locate().await.unwrap().unwrap(), id);

        let content = drive.download(&id).await.unwrap();
        assert!(content.contains("second"));
        let patch = gateway.pull().await.unwrap().unwrap();
        assert_eq!(patch.projects.unwrap()[0].name, "second");
    }

    #[tokio::test]
    async fn test_malformed_remote_is_sync_error() {
        let tmp = TempDir::new().unwrap();
        let (gateway, drive) = gateway(&tmp).await;
        drive
            .create_file(REMOTE_FILE_NAME, "not json")
            .await
            .unwrap();
        let err = gateway.pull().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Sync);
    }
}
