//! The `App` ties the local store, the remote session and the advisor together. Every surface (the
//! CLI commands and the MCP tools) goes through it.

use crate::advisor::{Advisor, Gemini, Generator};
use crate::api::Mode;
use crate::backup::PRE_PULL;
use crate::error::{ErrorType, IntoResult};
use crate::model::{
    category_id, Amount, Category, Color, Icon, Project, ProjectSummary, Transaction,
    TransactionType,
};
use crate::repo::Repository;
use crate::session::{Session, SessionStatus};
use crate::{Config, Error, Result};
use anyhow::anyhow;
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Which way `App::sync` moves data.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Replace local data with the remote snapshot, or create the remote snapshot if there is none.
    #[default]
    Pull,
    /// Replace the remote snapshot with local data.
    Push,
}

serde_plain::derive_display_from_serialize!(SyncDirection);

/// What a sync actually did.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SyncOutcome {
    /// Not logged in, nothing happened.
    Skipped,
    /// Local data was replaced by the remote snapshot. The previous local data was saved to
    /// `backup`.
    Pulled { backup: PathBuf },
    /// There was no remote snapshot, so one was created from local data.
    Initialized,
    /// The remote snapshot was replaced with local data.
    Pushed,
}

/// The fields a user supplies for a new transaction.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    pub title: String,
    pub description: String,
    /// Parsed with `Amount::from_str`, e.g. `12.5` or `$1,200.00`.
    pub amount: String,
    pub transaction_type: TransactionType,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// A category id. When omitted the advisor picks one.
    pub category: Option<String>,
}

/// The project whose transactions are currently loaded.
#[derive(Debug, Clone)]
pub struct ProjectView {
    pub project: Project,
    /// Newest first.
    pub transactions: Vec<Transaction>,
}

pub struct App {
    config: Config,
    mode: Mode,
    repo: Repository,
    session: Session,
    advisor: Advisor,
    projects: Vec<Project>,
    categories: Vec<Category>,
    view: Option<ProjectView>,
    pending: Vec<JoinHandle<Result<()>>>,
    /// Closes when the most recently scheduled push has finished.
    last_push: Option<oneshot::Receiver<()>>,
    last_error: Option<String>,
}

impl App {
    /// Opens the local store, restores the session from a saved token if there is one, and loads
    /// projects and categories.
    pub async fn open(config: Config, mode: Mode) -> Result<Self> {
        let repo = Repository::new(Box::new(config.db().clone()));
        let session = Session::resume(&config, mode).await;
        let advisor = Advisor::new(config.advisor_api_key().map(|key| {
            Box::new(Gemini::new(key, config.advisor_model())) as Generator
        }));
        let mut app = Self {
            config,
            mode,
            repo,
            session,
            advisor,
            projects: Vec::new(),
            categories: Vec::new(),
            view: None,
            pending: Vec::new(),
            last_push: None,
            last_error: None,
        };
        app.reload().await?;
        debug!(
            "Opened with {} projects, session {}",
            app.projects.len(),
            app.session.status()
        );
        Ok(app)
    }

    #[cfg(test)]
    pub(crate) fn set_advisor(&mut self, advisor: Advisor) {
        self.advisor = advisor;
    }

    /// Logs in to `remote` without going through the consent flow.
    #[cfg(test)]
    pub(crate) fn set_remote(&mut self, remote: crate::api::Remote) {
        self.session = Session::connected(crate::api::SyncGateway::new(remote));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn advisor_configured(&self) -> bool {
        self.advisor.is_configured()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn view(&self) -> Option<&ProjectView> {
        self.view.as_ref()
    }

    /// The message of the most recent failed background push, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn reload(&mut self) -> Result<()> {
        self.projects = self.repo.projects().await.pub_result(ErrorType::Storage)?;
        self.categories = self
            .repo
            .categories()
            .await
            .pub_result(ErrorType::Storage)?;
        if let Some(id) = self.view.as_ref().map(|v| v.project.id.clone()) {
            self.view = match self.find_project(&id) {
                Ok(_) => Some(self.load_view(&id).await?),
                Err(_) => None,
            };
        }
        Ok(())
    }

    fn find_project(&self, id: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| request_error(format!("There is no project with id '{id}'")))
    }

    async fn load_view(&self, project_id: &str) -> Result<ProjectView> {
        let project = self.find_project(project_id)?.clone();
        let transactions = self.transactions(project_id).await?;
        Ok(ProjectView {
            project,
            transactions,
        })
    }

    /// Runs the consent flow, then pulls: a remote snapshot replaces local data, otherwise local
    /// data is pushed to create one.
    pub async fn login(&mut self) -> Result<SyncOutcome> {
        self.session.login(&self.config, self.mode).await?;
        info!("Logged in");
        self.sync(SyncDirection::Pull).await
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.settle().await.ok();
        self.session.logout(&self.config).await?;
        info!("Logged out");
        Ok(())
    }

    pub async fn sync(&mut self, direction: SyncDirection) -> Result<SyncOutcome> {
        let Some(gateway) = self.session.gateway().cloned() else {
            debug!("Not logged in, skipping sync");
            return Ok(SyncOutcome::Skipped);
        };
        match direction {
            SyncDirection::Push => {
                let snapshot = self.repo.snapshot().await.pub_result(ErrorType::Storage)?;
                gateway.push(&snapshot).await?;
                Ok(SyncOutcome::Pushed)
            }
            SyncDirection::Pull => match gateway.pull().await? {
                Some(patch) => {
                    let current = self.repo.snapshot().await.pub_result(ErrorType::Storage)?;
                    let backup = self
                        .config
                        .backup()
                        .save_json(PRE_PULL, &current)
                        .await
                        .pub_result(ErrorType::Storage)?;
                    debug!("Saved local data to {}", backup.display());
                    self.repo
                        .restore(&patch)
                        .await
                        .pub_result(ErrorType::Storage)?;
                    self.reload().await?;
                    info!("Replaced local data with the remote snapshot");
                    Ok(SyncOutcome::Pulled { backup })
                }
                None => {
                    let snapshot = self.repo.snapshot().await.pub_result(ErrorType::Storage)?;
                    gateway.push(&snapshot).await?;
                    info!("Created the remote snapshot");
                    Ok(SyncOutcome::Initialized)
                }
            },
        }
    }

    /// Pushes the current local data in the background when logged in. The snapshot is taken
    /// before this returns. Each push starts only after the previously scheduled one has finished,
    /// so the remote always ends up with the newest snapshot.
    async fn schedule_push(&mut self) -> Result<()> {
        let Some(gateway) = self.session.gateway().cloned() else {
            return Ok(());
        };
        let snapshot = self.repo.snapshot().await.pub_result(ErrorType::Storage)?;
        let (done, finished) = oneshot::channel::<()>();
        let previous = self.last_push.replace(finished);
        self.pending.push(tokio::spawn(async move {
            if let Some(previous) = previous {
                // Resolves, with an error, as soon as the previous task drops its sender.
                let _ = previous.await;
            }
            let result = gateway.push(&snapshot).await;
            drop(done);
            result
        }));
        Ok(())
    }

    /// Waits for all background pushes. Returns the last failure, if any.
    pub async fn settle(&mut self) -> Result<()> {
        let mut failure = None;
        for handle in std::mem::take(&mut self.pending) {
            if let Err(e) = self.record(handle.await) {
                failure = Some(e);
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Collects background pushes that have already finished without waiting for the others.
    pub async fn reap(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|h| h.is_finished());
        self.pending = running;
        for handle in finished {
            let _ = self.record(handle.await);
        }
    }

    fn record(
        &mut self,
        joined: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> Result<()> {
        let result = match joined {
            Ok(result) => result,
            Err(e) => Err(Error::new(ErrorType::Internal, e)),
        };
        if let Err(e) = &result {
            warn!("Background sync failed: {e}");
            self.last_error = Some(e.to_string());
        }
        result
    }

    pub async fn create_project(
        &mut self,
        name: &str,
        description: &str,
        currency: Option<String>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(request_error("A project name is required"));
        }
        let project = Project::new(name, description.trim(), currency);
        self.projects = self
            .repo
            .add_project(project.clone())
            .await
            .pub_result(ErrorType::Storage)?;
        info!("Created project '{}'", project.name);
        self.schedule_push().await?;
        Ok(project)
    }

    /// Makes `id` the current project and loads its transactions.
    pub async fn select_project(&mut self, id: &str) -> Result<&ProjectView> {
        let view = self.load_view(id).await?;
        Ok(self.view.insert(view))
    }

    /// The project's transactions, newest first. Transactions on the same date keep the order in
    /// which they were added.
    pub async fn transactions(&self, project_id: &str) -> Result<Vec<Transaction>> {
        let mut transactions = self
            .repo
            .transactions(Some(project_id))
            .await
            .pub_result(ErrorType::Storage)?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    pub async fn add_transaction(
        &mut self,
        project_id: &str,
        input: NewTransaction,
    ) -> Result<Transaction> {
        self.find_project(project_id)?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(request_error("A transaction title is required"));
        }
        let amount = Amount::from_str(&input.amount).map_err(|e| {
            request_error(format!("The amount '{}' is invalid: {e}", input.amount))
        })?;
        let category = match input.category {
            Some(category) => category,
            None => {
                self.advisor
                    .suggest_category(title, &input.description, &self.categories)
                    .await
            }
        };
        let transaction = Transaction {
            id: crate::utils::generate_id(),
            project_id: project_id.to_string(),
            title: title.to_string(),
            description: input.description.trim().to_string(),
            amount,
            transaction_type: input.transaction_type,
            date: input.date.unwrap_or_else(|| Local::now().date_naive()),
            category,
        };
        self.repo
            .add_transaction(transaction.clone())
            .await
            .pub_result(ErrorType::Storage)?;
        info!(
            "Added {} '{}' {}",
            transaction.transaction_type,
            transaction.title,
            transaction.signed_amount()
        );
        self.refresh_view(project_id).await?;
        self.schedule_push().await?;
        Ok(transaction)
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<Transaction> {
        let all = self
            .repo
            .transactions(None)
            .await
            .pub_result(ErrorType::Storage)?;
        let removed = all
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| request_error(format!("There is no transaction with id '{id}'")))?;
        self.repo
            .remove_transaction(id)
            .await
            .pub_result(ErrorType::Storage)?;
        info!("Deleted transaction '{}'", removed.title);
        self.refresh_view(&removed.project_id).await?;
        self.schedule_push().await?;
        Ok(removed)
    }

    async fn refresh_view(&mut self, project_id: &str) -> Result<()> {
        if self.view.as_ref().is_some_and(|v| v.project.id == project_id) {
            self.view = Some(self.load_view(project_id).await?);
        }
        Ok(())
    }

    pub async fn add_category(&mut self, name: &str, color: Color, icon: Icon) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(request_error("A category name is required"));
        }
        let seed = Utc::now().timestamp_millis().unsigned_abs();
        let id = category_id(name, seed, self.categories.iter().map(|c| c.id.as_str()));
        let category = Category::new(id, name, color, icon);
        self.categories = self
            .repo
            .add_category(category.clone())
            .await
            .pub_result(ErrorType::Storage)?;
        info!("Added category '{}' ({})", category.name, category.id);
        self.schedule_push().await?;
        Ok(category)
    }

    /// Deletes a user-created category. Transactions that reference it are left alone.
    pub async fn delete_category(&mut self, id: &str) -> Result<Category> {
        let category = self
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| request_error(format!("There is no category with id '{id}'")))?;
        if category.is_default {
            return Err(request_error(format!(
                "'{}' is a built-in category and cannot be deleted",
                category.name
            )));
        }
        self.categories = self
            .repo
            .remove_category(id)
            .await
            .pub_result(ErrorType::Storage)?;
        info!("Deleted category '{}'", category.name);
        self.schedule_push().await?;
        Ok(category)
    }

    /// Overwrites the whole category set. Ids must be unique and names non-blank.
    pub async fn replace_categories(&mut self, categories: Vec<Category>) -> Result<()> {
        for (i, category) in categories.iter().enumerate() {
            if category.id.trim().is_empty() || category.name.trim().is_empty() {
                return Err(request_error("Every category needs an id and a name"));
            }
            if categories[..i].iter().any(|c| c.id == category.id) {
                return Err(request_error(format!(
                    "The category id '{}' appears more than once",
                    category.id
                )));
            }
        }
        self.repo
            .save_categories(&categories)
            .await
            .pub_result(ErrorType::Storage)?;
        self.categories = categories;
        self.schedule_push().await
    }

    pub async fn summary(&self, project_id: &str) -> Result<ProjectSummary> {
        self.find_project(project_id)?;
        let transactions = self.transactions(project_id).await?;
        ProjectSummary::new(&transactions, &self.categories)
            .ok_or_else(|| request_error("The project's totals are too large to add up"))
    }

    /// Advisory analysis of the project. Advisory problems come back as a message, not an error.
    pub async fn analyze(&self, project_id: &str) -> Result<String> {
        let project = self.find_project(project_id)?;
        let transactions = self.transactions(project_id).await?;
        Ok(self.advisor.analyze(project, &transactions).await)
    }

    pub async fn suggest_category(&self, title: &str, description: &str) -> String {
        self.advisor
            .suggest_category(title, description, &self.categories)
            .await
    }
}

fn request_error(message: impl Into<String>) -> Error {
    Error::new(ErrorType::Request, anyhow!(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::tests::Scripted;
    use crate::api::RemoteStore;
    use crate::error::Res;
    use crate::model::{default_categories, AppData, Hue};
    use crate::test::TestEnv;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// An in-memory remote. When `fast` is set, writes take a while unless their content contains
    /// it. A `broken` remote fails every call.
    #[derive(Default)]
    struct MemoryRemote {
        files: Mutex<Vec<(String, String)>>,
        fast: Option<&'static str>,
        broken: bool,
    }

    impl MemoryRemote {
        fn slow_unless(marker: &'static str) -> Arc<Self> {
            Arc::new(Self {
                fast: Some(marker),
                ..Default::default()
            })
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self {
                broken: true,
                ..Default::default()
            })
        }

        fn holding(content: &str) -> Arc<Self> {
            let remote = Self::default();
            remote
                .files
                .lock()
                .unwrap()
                .push((crate::api::REMOTE_FILE_NAME.to_string(), content.to_string()));
            Arc::new(remote)
        }

        fn contents(&self) -> Vec<String> {
            self.files
                .lock()
                .unwrap()
                .iter()
                .map(|(_, content)| content.clone())
                .collect()
        }

        async fn delay(&self, content: &str) -> Res<()> {
            if self.broken {
                bail!("remote is down");
            }
            if self.fast.is_some_and(|marker| !content.is_empty() && !content.contains(marker)) {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for MemoryRemote {
        async fn find_file(&self, name: &str) -> Res<Option<String>> {
            self.delay("").await?;
            let files = self.files.lock().unwrap();
            Ok(files.iter().position(|(n, _)| n == name).map(|i| i.to_string()))
        }

        async fn create_file(&self, name: &str, content: &str) -> Res<String> {
            self.delay(content).await?;
            let mut files = self.files.lock().unwrap();
            files.push((name.to_string(), content.to_string()));
            Ok((files.len() - 1).to_string())
        }

        async fn update_file(&self, id: &str, content: &str) -> Res<()> {
            self.delay(content).await?;
            let i: usize = id.parse()?;
            self.files.lock().unwrap()[i].1 = content.to_string();
            Ok(())
        }

        async fn download(&self, id: &str) -> Res<String> {
            self.delay("").await?;
            let i: usize = id.parse()?;
            Ok(self.files.lock().unwrap()[i].1.clone())
        }
    }

    fn expense(title: &str, amount: &str, category: Option<&str>) -> NewTransaction {
        NewTransaction {
            title: title.to_string(),
            amount: amount.to_string(),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_project_and_add_transaction() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        assert_eq!(app.projects().len(), 1);

        let t = app
            .add_transaction(&project.id, expense("Coffee", "12.5", Some("food")))
            .await
            .unwrap();
        assert_eq!(t.amount.plain(), "12.5");
        assert_eq!(t.transaction_type, TransactionType::Expense);
        assert_eq!(t.date, Local::now().date_naive());
    }

    #[tokio::test]
    async fn test_add_transaction_validation() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let err = app
            .add_transaction("missing", expense("Coffee", "1", None))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);

        let project = app.create_project("Home", "", None).await.unwrap();
        let err = app
            .add_transaction(&project.id, expense("Coffee", "abc", None))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
        let err = app
            .add_transaction(&project.id, expense("  ", "1", None))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
        assert!(app.create_project(" ", "", None).await.is_err());
    }

    #[tokio::test]
    async fn test_add_transaction_uses_suggestion() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        app.set_advisor(Advisor::new(Some(Box::new(Scripted::answering("food")))));
        let project = app.create_project("Home", "", None).await.unwrap();
        let t = app
            .add_transaction(&project.id, expense("Lunch", "9", None))
            .await
            .unwrap();
        assert_eq!(t.category, "food");

        let t = app
            .add_transaction(&project.id, expense("Mystery", "9", None))
            .await;
        assert_eq!(t.unwrap().category, "food");
    }

    #[tokio::test]
    async fn test_unconfigured_advisor_suggests_other() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        let t = app
            .add_transaction(&project.id, expense("Netflix", "15", None))
            .await
            .unwrap();
        assert_eq!(t.category, "other");
    }

    #[tokio::test]
    async fn test_select_project_orders_newest_first() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        for (title, day) in [("a", 3), ("b", 10), ("c", 1)] {
            let mut input = expense(title, "1", Some("food"));
            input.date = NaiveDate::from_ymd_opt(2025, 1, day);
            app.add_transaction(&project.id, input).await.unwrap();
        }
        let view = app.select_project(&project.id).await.unwrap();
        let titles: Vec<&str> = view.transactions.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);

        let removed = view.transactions[1].id.clone();
        app.delete_transaction(&removed).await.unwrap();
        let titles: Vec<String> = app
            .view()
            .unwrap()
            .transactions
            .iter()
            .map(|t| t.title.clone())
            .collect();
        assert_eq!(titles, vec!["b", "c"]);
        assert!(app.delete_transaction(&removed).await.is_err());
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        let gym = app
            .add_category("Gym", Color::new(Hue::Teal), Icon::Heart)
            .await
            .unwrap();
        assert!(gym.id.starts_with("gym_"));
        assert_eq!(gym.id.len(), "gym_".len() + 4);
        app.add_transaction(&project.id, expense("Membership", "40", Some(&gym.id)))
            .await
            .unwrap();

        let err = app.delete_category("food").await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
        assert!(app.delete_category("nope").await.is_err());

        app.delete_category(&gym.id).await.unwrap();
        let summary = app.summary(&project.id).await.unwrap();
        assert_eq!(summary.expense_by_category[0].label, gym.id);
        assert_eq!(app.transactions(&project.id).await.unwrap()[0].category, gym.id);

        app.replace_categories(Vec::new()).await.unwrap();
        assert!(app.categories().is_empty());
    }

    #[tokio::test]
    async fn test_sync_when_logged_out_is_skipped() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        assert_eq!(app.status(), SessionStatus::LoggedOut);
        let outcome = app.sync(SyncDirection::Pull).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_first_login_initializes_remote() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let outcome = app.login().await.unwrap();
        assert_eq!(outcome, SyncOutcome::Initialized);

        let remote: AppData = env.remote_snapshot().await.unwrap();
        assert!(remote.projects.is_empty());
        assert!(remote.transactions.is_empty());
        assert_eq!(remote.categories, default_categories());
    }

    #[tokio::test]
    async fn test_mutations_push_in_background() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        app.login().await.unwrap();
        let project = app.create_project("Trip", "", Some("eur".into())).await.unwrap();
        app.add_transaction(&project.id, expense("Train", "30", Some("transport")))
            .await
            .unwrap();
        app.settle().await.unwrap();
        assert!(app.last_error().is_none());

        let remote = env.remote_snapshot().await.unwrap();
        assert_eq!(remote.projects[0].currency, "EUR");
        assert_eq!(remote.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_background_pushes_run_in_order() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let remote = MemoryRemote::slow_unless("Second");
        app.set_remote(remote.clone());

        app.create_project("First", "", None).await.unwrap();
        app.create_project("Second", "", None).await.unwrap();
        app.settle().await.unwrap();

        let contents = remote.contents();
        assert_eq!(contents.len(), 1, "pushes created more than one file");
        let remote: AppData = serde_json::from_str(&contents[0]).unwrap();
        let names: Vec<&str> = remote.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_data() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        app.set_remote(MemoryRemote::broken());

        let project = app.create_project("Home", "", None).await.unwrap();
        app.add_transaction(&project.id, expense("Rent", "900", Some("housing")))
            .await
            .unwrap();
        let err = app.settle().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Sync);
        assert!(app.last_error().unwrap().contains("sync error"));

        drop(app);
        let app = env.app().await;
        assert_eq!(app.projects().len(), 1);
        assert_eq!(app.transactions(&project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_local_data() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        app.add_transaction(&project.id, expense("Rent", "900", Some("housing")))
            .await
            .unwrap();

        app.set_remote(MemoryRemote::holding("{not json"));
        let err = app.sync(SyncDirection::Pull).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Sync);
        app.set_remote(MemoryRemote::broken());
        let err = app.sync(SyncDirection::Pull).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Sync);

        assert_eq!(app.projects().len(), 1);
        assert_eq!(app.transactions(&project.id).await.unwrap().len(), 1);
        assert_eq!(app.categories(), default_categories().as_slice());
    }

    #[tokio::test]
    async fn test_login_pull_replaces_local() {
        let env = TestEnv::new().await;

        // Another device pushes five transactions.
        let mut other = env.app().await;
        other.login().await.unwrap();
        let remote_project = other.create_project("Shared", "", None).await.unwrap();
        for i in 0..5 {
            other
                .add_transaction(&remote_project.id, expense(&format!("r{i}"), "1", Some("food")))
                .await
                .unwrap();
        }
        other.settle().await.unwrap();
        other.logout().await.unwrap();
        drop(other);

        // This device has three different local transactions.
        env.clear_local().await;
        let mut app = env.app().await;
        let local = app.create_project("Local", "", None).await.unwrap();
        for i in 0..3 {
            app.add_transaction(&local.id, expense(&format!("l{i}"), "1", Some("food")))
                .await
                .unwrap();
        }

        let outcome = app.login().await.unwrap();
        let SyncOutcome::Pulled { backup } = outcome else {
            panic!("expected a pull, got {outcome:?}");
        };
        assert!(backup.is_file());
        assert_eq!(app.projects().len(), 1);
        assert_eq!(app.projects()[0].id, remote_project.id);
        let titles: Vec<String> = app
            .transactions(&remote_project.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles.len(), 5);
        assert!(titles.iter().all(|t| t.starts_with('r')));
        assert!(app.transactions(&local.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        app.login().await.unwrap();
        app.logout().await.unwrap();
        assert_eq!(app.status(), SessionStatus::LoggedOut);
        app.logout().await.unwrap();
        let app = env.app().await;
        assert_eq!(app.status(), SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn test_summary_too_large_is_request_error() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        let max = rust_decimal::Decimal::MAX.to_string();
        for title in ["a", "b"] {
            app.add_transaction(&project.id, expense(title, &max, Some("food")))
                .await
                .unwrap();
        }
        let err = app.summary(&project.id).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
    }

    #[tokio::test]
    async fn test_analyze() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let project = app.create_project("Home", "", None).await.unwrap();
        assert_eq!(
            app.analyze(&project.id).await.unwrap(),
            crate::advisor::UNAVAILABLE
        );
        app.set_advisor(Advisor::new(Some(Box::new(Scripted::answering("Nice")))));
        assert_eq!(
            app.analyze(&project.id).await.unwrap(),
            crate::advisor::NOT_ENOUGH_DATA
        );
        app.add_transaction(&project.id, expense("Rent", "900", Some("housing")))
            .await
            .unwrap();
        assert_eq!(app.analyze(&project.id).await.unwrap(), "Nice");
        assert!(app.analyze("missing").await.is_err());
    }
}
