use crate::error::Res;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs::ReadDir;

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Res<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Res<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Copies `from` -> `to`, leaving `from` in place.
pub(crate) async fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Res<()> {
    tokio::fs::copy(from.as_ref(), to.as_ref())
        .await
        .with_context(|| {
            format!(
                "Unable to copy file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })?;
    Ok(())
}

/// Removes a file.
pub(crate) async fn remove(path: impl AsRef<Path>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::remove_file(path)
        .await
        .with_context(|| format!("Unable to remove file {}", path.display()))
}

/// Creates a directory and its parents if they do not exist.
pub(crate) async fn make_dir(p: impl AsRef<Path>) -> Res<()> {
    let p = p.as_ref();
    tokio::fs::create_dir_all(p)
        .await
        .with_context(|| format!("Unable to create directory at {}", p.to_string_lossy()))
}

pub(crate) async fn canonicalize(p: impl AsRef<Path>) -> Res<PathBuf> {
    let p = p.as_ref();
    tokio::fs::canonicalize(p)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", p.to_string_lossy()))
}

pub(crate) async fn read_dir(p: impl AsRef<Path>) -> Res<ReadDir> {
    let p = p.as_ref();
    tokio::fs::read_dir(p)
        .await
        .with_context(|| format!("Unable to read directory {}", p.to_string_lossy()))
}

/// Restricts a secrets file to its owner.
pub(crate) fn restrict_permissions(path: &Path) -> Res<()> {
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Generates a new unique entity id.
pub(crate) fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[tokio::test]
async fn test_write_read_remove() {
    let dir = tempfile::TempDir::new().unwrap();
    let p = dir.path().join("a.json");
    write(&p, r#"{"x": 1}"#).await.unwrap();
    let value: serde_json::Value = deserialize(&p).await.unwrap();
    assert_eq!(value["x"], 1);
    let copied = dir.path().join("b.json");
    copy(&p, &copied).await.unwrap();
    assert!(p.is_file());
    remove(&p).await.unwrap();
    assert!(!p.exists());
    assert_eq!(read(&copied).await.unwrap(), r#"{"x": 1}"#);
}

#[test]
fn test_generate_id_is_unique() {
    assert_ne!(generate_id(), generate_id());
}
