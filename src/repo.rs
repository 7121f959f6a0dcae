//! Typed access to the projects, transactions and categories held in a `RecordStore`.
//!
//! Each collection is stored as one JSON array under its own key. Every write replaces the whole
//! array, so a collection is always read back in the order it was last written.

use crate::error::Res;
use crate::model::{default_categories, AppData, AppDataPatch, Category, Project, Transaction};
use crate::store::{RecordStore, CATEGORIES_KEY, PROJECTS_KEY, TRANSACTIONS_KEY};
use anyhow::Context;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

pub(crate) type Store = Box<dyn RecordStore + Send + Sync>;

pub(crate) struct Repository {
    store: Store,
}

impl Repository {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Res<Option<Vec<T>>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let items = serde_json::from_str(&raw)
            .with_context(|| format!("The stored value for '{key}' is malformed"))?;
        Ok(Some(items))
    }

    async fn write<T: Serialize>(&self, key: &str, items: &[T]) -> Res<()> {
        let raw = encode(key, items)?;
        trace!("Writing {} items to '{key}'", items.len());
        self.store.set(key, &raw).await
    }

    pub(crate) async fn projects(&self) -> Res<Vec<Project>> {
        Ok(self.read(PROJECTS_KEY).await?.unwrap_or_default())
    }

    pub(crate) async fn save_projects(&self, projects: &[Project]) -> Res<()> {
        self.write(PROJECTS_KEY, projects).await
    }

    pub(crate) async fn add_project(&self, project: Project) -> Res<Vec<Project>> {
        let mut projects = self.projects().await?;
        projects.push(project);
        self.save_projects(&projects).await?;
        Ok(projects)
    }

    /// All transactions, or only those belonging to `project_id` when it is given.
    pub(crate) async fn transactions(&self, project_id: Option<&str>) -> Res<Vec<Transaction>> {
        let all: Vec<Transaction> = self.read(TRANSACTIONS_KEY).await?.unwrap_or_default();
        Ok(match project_id {
            None => all,
            Some(id) => all.into_iter().filter(|t| t.project_id == id).collect(),
        })
    }

    pub(crate) async fn save_transactions(&self, transactions: &[Transaction]) -> Res<()> {
        self.write(TRANSACTIONS_KEY, transactions).await
    }

    /// Appends to the full stored collection, not to a project's subset.
    pub(crate) async fn add_transaction(&self, transaction: Transaction) -> Res<Vec<Transaction>> {
        let mut transactions = self.transactions(None).await?;
        transactions.push(transaction);
        self.save_transactions(&transactions).await?;
        Ok(transactions)
    }

    /// Removes the transaction with `id` if there is one.
    pub(crate) async fn remove_transaction(&self, id: &str) -> Res<Vec<Transaction>> {
        let mut transactions = self.transactions(None).await?;
        transactions.retain(|t| t.id != id);
        self.save_transactions(&transactions).await?;
        Ok(transactions)
    }

    /// The stored categories, or the defaults if none have ever been saved.
    pub(crate) async fn categories(&self) -> Res<Vec<Category>> {
        Ok(self
            .read(CATEGORIES_KEY)
            .await?
            .unwrap_or_else(default_categories))
    }

    pub(crate) async fn save_categories(&self, categories: &[Category]) -> Res<()> {
        self.write(CATEGORIES_KEY, categories).await
    }

    pub(crate) async fn add_category(&self, category: Category) -> Res<Vec<Category>> {
        let mut categories = self.categories().await?;
        categories.push(category);
        self.save_categories(&categories).await?;
        Ok(categories)
    }

    pub(crate) async fn remove_category(&self, id: &str) -> Res<Vec<Category>> {
        let mut categories = self.categories().await?;
        categories.retain(|c| c.id != id);
        self.save_categories(&categories).await?;
        Ok(categories)
    }

    /// Reads everything into one `AppData` stamped with the current time.
    pub(crate) async fn snapshot(&self) -> Res<AppData> {
        Ok(AppData {
            projects: self.projects().await?,
            transactions: self.transactions(None).await?,
            categories: self.categories().await?,
            last_synced: Utc::now(),
        })
    }

    /// Overwrites each collection present in `patch` in a single store write.
    pub(crate) async fn restore(&self, patch: &AppDataPatch) -> Res<()> {
        let mut entries = Vec::new();
        if let Some(projects) = &patch.projects {
            entries.push((PROJECTS_KEY, encode(PROJECTS_KEY, projects)?));
        }
        if let Some(transactions) = &patch.transactions {
            entries.push((TRANSACTIONS_KEY, encode(TRANSACTIONS_KEY, transactions)?));
        }
        if let Some(categories) = &patch.categories {
            entries.push((CATEGORIES_KEY, encode(CATEGORIES_KEY, categories)?));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.store.set_many(&entries).await
    }
}

fn encode<T: Serialize>(key: &str, items: &[T]) -> Res<String> {
    serde_json::to_string(items).with_context(|| format!("Unable to serialize '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Color, Hue, Icon, TransactionType};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn repo() -> Repository {
        Repository::new(Box::new(MemoryStore::default()))
    }

    fn txn(id: &str, project_id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            project_id: project_id.to_string(),
            title: format!("title {id}"),
            description: String::new(),
            amount: Amount::from_str("10").unwrap(),
            transaction_type: TransactionType::Expense,
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            category: "food".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_defaults() {
        let repo = repo();
        assert!(repo.projects().await.unwrap().is_empty());
        assert!(repo.transactions(None).await.unwrap().is_empty());
        assert_eq!(repo.categories().await.unwrap(), default_categories());
    }

    #[tokio::test]
    async fn test_saved_empty_categories_stay_empty() {
        let repo = repo();
        repo.save_categories(&[]).await.unwrap();
        assert!(repo.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_remove_keeps_order() {
        let repo = repo();
        for id in ["a", "b", "c", "d"] {
            repo.add_transaction(txn(id, "p1")).await.unwrap();
        }
        let left = repo.remove_transaction("b").await.unwrap();
        let ids: Vec<&str> = left.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        let left = repo.remove_transaction("missing").await.unwrap();
        assert_eq!(left.len(), 3);
    }

    #[tokio::test]
    async fn test_filter_by_project() {
        let repo = repo();
        repo.add_transaction(txn("a", "p1")).await.unwrap();
        repo.add_transaction(txn("b", "p2")).await.unwrap();
        repo.add_transaction(txn("c", "p1")).await.unwrap();
        let p1 = repo.transactions(Some("p1")).await.unwrap();
        assert_eq!(p1.len(), 2);
        assert!(p1.iter().all(|t| t.project_id == "p1"));
        assert!(repo.transactions(Some("p3")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_add_remove() {
        let repo = repo();
        let gym = Category::new("gym_0001", "Gym", Color::new(Hue::Teal), Icon::Heart);
        let categories = repo.add_category(gym).await.unwrap();
        assert_eq!(categories.len(), 10);
        let categories = repo.remove_category("gym_0001").await.unwrap();
        assert_eq!(categories, default_categories());
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let source = repo();
        source
            .add_project(Project::new("Home", "", None))
            .await
            .unwrap();
        source.add_transaction(txn("a", "p1")).await.unwrap();
        let snapshot = source.snapshot().await.unwrap();

        let target = repo();
        target
            .restore(&AppDataPatch::from(snapshot.clone()))
            .await
            .unwrap();
        let restored = target.snapshot().await.unwrap();
        assert_eq!(restored.projects, snapshot.projects);
        assert_eq!(restored.transactions, snapshot.transactions);
        assert_eq!(restored.categories, snapshot.categories);
    }

    #[tokio::test]
    async fn test_restore_partial_patch() {
        let repo = repo();
        repo.add_transaction(txn("a", "p1")).await.unwrap();
        let patch = AppDataPatch {
            projects: Some(vec![Project::new("Remote", "", None)]),
            ..Default::default()
        };
        repo.restore(&patch).await.unwrap();
        assert_eq!(repo.projects().await.unwrap()[0].name, "Remote");
        assert_eq!(repo.transactions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_data_is_an_error() {
        let store = MemoryStore::default();
        store.set(PROJECTS_KEY, "{not json").await.unwrap();
        let repo = Repository::new(Box::new(store));
        assert!(repo.projects().await.is_err());
    }
}
