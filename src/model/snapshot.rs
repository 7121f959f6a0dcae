use crate::model::{Category, Project, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The full data set, synced to the remote store as one unit.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub projects: Vec<Project>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    /// When the snapshot was taken. Informational only, never used to order writes.
    pub last_synced: DateTime<Utc>,
}

/// A snapshot as read back from the remote store. Collections missing from the payload are `None`
/// and are left untouched when the patch is restored.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<String>,
}

impl From<AppData> for AppDataPatch {
    fn from(data: AppData) -> Self {
        Self {
            projects: Some(data.projects),
            transactions: Some(data.transactions),
            categories: Some(data.categories),
            last_synced: Some(data.last_synced.to_rfc3339()),
        }
    }
}

#[test]
fn test_patch_from_partial_payload() {
    let patch: AppDataPatch =
        serde_json::from_str(r#"{"projects":[],"lastSynced":"2025-01-01T00:00:00.000Z"}"#).unwrap();
    assert_eq!(patch.projects, Some(Vec::new()));
    assert!(patch.transactions.is_none());
    assert!(patch.categories.is_none());
}

#[test]
fn test_app_data_wire_shape() {
    let data = AppData {
        projects: Vec::new(),
        transactions: Vec::new(),
        categories: crate::model::default_categories(),
        last_synced: Utc::now(),
    };
    let value = serde_json::to_value(&data).unwrap();
    let obj = value.as_object().unwrap();
    for key in ["projects", "transactions", "categories", "lastSynced"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
}
