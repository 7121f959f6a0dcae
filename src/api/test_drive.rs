//! Implements the `RemoteStore` trait with a local directory standing in for Google Drive.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Drive.

use crate::api::RemoteStore;
use crate::error::Res;
use crate::utils;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

const INDEX: &str = "index.json";

/// Keeps an `index.json` listing file ids and names in creation order, plus one `{id}.json` per
/// file holding its content.
#[derive(Debug)]
pub(crate) struct TestDrive {
    dir: PathBuf,
    // Serializes index read-modify-write cycles.
    lock: Mutex<()>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Entry {
    id: String,
    name: String,
}

impl TestDrive {
    pub(crate) async fn new(dir: impl Into<PathBuf>) -> Res<Self> {
        let dir = dir.into();
        utils::make_dir(&dir).await?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    async fn index(&self) -> Res<Vec<Entry>> {
        let path = self.dir.join(INDEX);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        utils::deserialize(&path).await
    }

    fn content_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl RemoteStore for TestDrive {
    async fn find_file(&self, name: &str) -> Res<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .index()
            .await?
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.id))
    }

    async fn create_file(&self, name: &str, content: &str) -> Res<String> {
        let _guard = self.lock.lock().await;
        let id = utils::generate_id();
        utils::write(self.content_path(&id), content).await?;
        let mut index = self.index().await?;
        index.push(Entry {
            id: id.clone(),
            name: name.to_string(),
        });
        let json = serde_json::to_string_pretty(&index)?;
        utils::write(self.dir.join(INDEX), json).await?;
        Ok(id)
    }

    async fn update_file(&self, id: &str, content: &str) -> Res<()> {
        let _guard = self.lock.lock().await;
        anyhow::ensure!(
            self.index().await?.iter().any(|e| e.id == id),
            "File {id} not found"
        );
        utils::write(self.content_path(id), content).await
    }

    async fn download(&self, id: &str) -> Res<String> {
        let _guard = self.lock.lock().await;
        utils::read(&self.content_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_find_update_download() {
        let tmp = TempDir::new().unwrap();
        let drive = TestDrive::new(tmp.path().join("remote")).await.unwrap();
        assert!(drive.find_file("a.json").await.unwrap().is_none());

        let id = drive.create_file("a.json", "one").await.unwrap();
        assert_eq!(drive.find_file("a.json").await.unwrap(), Some(id.clone()));
        assert_eq!(drive.download(&id).await.unwrap(), "one");

        drive.update_file(&id, "two").await.unwrap();
        assert_eq!(drive.download(&id).await.unwrap(), "two");
        assert!(drive.update_file("nope", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicates_resolve_to_first() {
        let tmp = TempDir::new().unwrap();
        let drive = TestDrive::new(tmp.path()).await.unwrap();
        let first = drive.create_file("a.json", "1").await.unwrap();
        drive.create_file("a.json", "2").await.unwrap();
        assert_eq!(drive.find_file("a.json").await.unwrap(), Some(first));
    }
}
