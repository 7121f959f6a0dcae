//! Backups of the local data, taken before a pulled snapshot overwrites it.

use crate::error::Res;
use crate::model::AppData;
use crate::{utils, Config};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Prefix for backups taken before a remote snapshot replaces local data.
pub const PRE_PULL: &str = "pre-pull";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `data` as a pretty-printed JSON backup file named `{prefix}.YYYY-MM-DD-NNN.json`,
    /// where NNN counts up within the day. Older backups with the same prefix are deleted so that
    /// only `backup_copies` remain.
    ///
    /// Returns the path to the created backup file.
    pub(crate) async fn save_json(&self, prefix: &str, data: &AppData) -> Res<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self.backups_dir.join(format!("{prefix}.{date}-{seq:03}.json"));

        let json = serde_json::to_string_pretty(data).context("Failed to serialize the backup")?;
        utils::write(&path, json).await?;

        self.rotate(prefix).await?;
        Ok(path)
    }

    async fn backup_files(&self, prefix: &str) -> Res<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        // The name format makes lexical order chronological.
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Res<u32> {
        let max_seq = self
            .backup_files(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    async fn rotate(&self, prefix: &str) -> Res<()> {
        let files = self.backup_files(prefix).await?;
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }
        Ok(())
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses NNN out of `{prefix}.{date}-NNN.json`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(".json")
}
