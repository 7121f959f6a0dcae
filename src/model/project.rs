use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";

/// A budget or venture that transactions are logged against.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schemars(with = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Project {
    /// Creates a project with a fresh id and creation time.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        currency: Option<String>,
    ) -> Self {
        Self {
            id: crate::utils::generate_id(),
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            currency: currency
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_currency),
        }
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[test]
fn test_new_project_currency() {
    let p = Project::new("Side gig", "", None);
    assert_eq!(p.currency, "USD");
    let p = Project::new("Trip", "Lisbon", Some(" eur ".to_string()));
    assert_eq!(p.currency, "EUR");
    assert_ne!(p.id, Project::new("Trip", "Lisbon", None).id);
}

#[test]
fn test_project_deserializes_iso_timestamp() {
    let json = r#"{"id":"p1","name":"Home","description":"","createdAt":"2025-03-01T10:20:30.000Z","currency":"USD"}"#;
    let p: Project = serde_json::from_str(json).unwrap();
    assert_eq!(p.created_at.to_rfc3339(), "2025-03-01T10:20:30+00:00");
}
