//! These structs provide the CLI interface for the fintrack CLI. The argument structs that are also
//! accepted by MCP tools derive `Deserialize` and `JsonSchema` so that both surfaces share them.

use crate::controller::{NewTransaction, SyncDirection};
use crate::model::{Category, Color, Hue, Icon, TransactionType};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// fintrack: track income and expenses per project.
///
/// Group your money into projects (a household, a side business, a trip), log income and expense
/// transactions against them, and see where the money goes. Data lives in a local SQLite database
/// and can be synced to a single file in your Google Drive so that several machines share it.
///
/// Set FINTRACK_ADVISOR_API_KEY to a Gemini API key to get AI insights and automatic category
/// suggestions.
///
/// There is also a mode in which an AI agent can use this program through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the database.
    ///
    /// This is the first command you should run. To enable Google Drive sync, create an OAuth
    /// client of type "Desktop app" in Google Cloud Console with the redirect URI
    /// http://localhost, download its JSON and pass it as --client-secret. You can run fintrack
    /// without it; sync will simply be disabled.
    Init(InitArgs),
    /// Log in to or out of Google Drive, or show the login status.
    Auth(AuthArgs),
    /// Pull the Drive snapshot over local data, or push local data to Drive.
    Sync(SyncArgs),
    /// Create and list projects.
    Project(ProjectArgs),
    /// Add, list and delete transactions.
    Transaction(TransactionArgs),
    /// Add, list and delete categories.
    Category(CategoryArgs),
    /// Show income, expense and balance totals for a project.
    Summary(ProjectIdArgs),
    /// Ask the advisor for an analysis of a project's finances.
    Analyze(ProjectIdArgs),
    /// Ask the advisor which category fits a transaction.
    Suggest(SuggestArgs),
    /// Run an MCP server on stdio.
    Mcp(McpArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where fintrack data and configuration is held. Defaults to ~/fintrack
    #[arg(long, env = "FINTRACK_HOME", default_value_t = default_fintrack_home())]
    fintrack_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, fintrack_home: PathBuf) -> Self {
        Self {
            log_level,
            fintrack_home: fintrack_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn fintrack_home(&self) -> &DisplayPath {
        &self.fintrack_home
    }
}

/// (Not shown): Args for the `fintrack init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to your downloaded OAuth client credentials. This file will be copied to the
    /// default secrets location in the data directory.
    #[arg(long)]
    client_secret: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(client_secret: Option<PathBuf>) -> Self {
        Self { client_secret }
    }

    pub fn client_secret(&self) -> Option<&Path> {
        self.client_secret.as_deref()
    }
}

/// (Not shown): Args for the `fintrack auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    #[command(subcommand)]
    action: AuthAction,
}

impl AuthArgs {
    pub fn new(action: AuthAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> AuthAction {
        self.action
    }
}

#[derive(Subcommand, Debug, Clone, Copy, Eq, PartialEq)]
pub enum AuthAction {
    /// Open the Google consent page, then pull the Drive snapshot (or create it from local data).
    Login,
    /// Revoke the grant and delete the saved token.
    Logout,
    /// Show whether sync is configured and whether you are logged in.
    Status,
}

/// (Not shown): Args for the `fintrack sync` command.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncArgs {
    /// "pull" replaces local data with the Drive snapshot (creating the snapshot if there is none).
    /// "push" replaces the Drive snapshot with local data.
    #[arg(value_enum, default_value_t)]
    #[serde(default)]
    direction: SyncDirection,
}

impl SyncArgs {
    pub fn new(direction: SyncDirection) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> SyncDirection {
        self.direction
    }
}

/// (Not shown): Args for the `fintrack project` command.
#[derive(Debug, Parser, Clone)]
pub struct ProjectArgs {
    #[command(subcommand)]
    action: ProjectAction,
}

impl ProjectArgs {
    pub fn action(&self) -> &ProjectAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectAction {
    /// Create a project.
    Create(CreateProjectArgs),
    /// List all projects.
    List,
}

/// Args for creating a project.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateProjectArgs {
    /// The project name.
    name: String,

    /// An optional description.
    #[arg(long, default_value = "")]
    #[serde(default)]
    description: String,

    /// A currency code such as USD or EUR. Defaults to USD.
    #[arg(long)]
    #[serde(default)]
    currency: Option<String>,
}

impl CreateProjectArgs {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        currency: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            currency,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }
}

/// Args that only identify a project.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectIdArgs {
    /// The project id.
    #[arg(long)]
    project: String,
}

impl ProjectIdArgs {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}

/// (Not shown): Args for the `fintrack transaction` command.
#[derive(Debug, Parser, Clone)]
pub struct TransactionArgs {
    #[command(subcommand)]
    action: TransactionAction,
}

impl TransactionArgs {
    pub fn action(&self) -> &TransactionAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionAction {
    /// Add a transaction to a project.
    Add(AddTransactionArgs),
    /// List a project's transactions, newest first.
    List(ProjectIdArgs),
    /// Delete a transaction.
    Delete(IdArgs),
}

/// Args for adding a transaction.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddTransactionArgs {
    /// The id of the project the transaction belongs to.
    #[arg(long)]
    project: String,

    /// A short title, e.g. "Groceries".
    #[arg(long)]
    title: String,

    /// An optional longer description.
    #[arg(long, default_value = "")]
    #[serde(default)]
    description: String,

    /// The amount as a positive number, e.g. 12.50. The type decides the sign.
    #[arg(long)]
    amount: String,

    /// "income" or "expense".
    #[arg(long = "type", value_enum, default_value_t)]
    #[serde(rename = "type", default)]
    transaction_type: TransactionType,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    date: Option<NaiveDate>,

    /// A category id. When omitted, the advisor suggests one (or "other" is used).
    #[arg(long)]
    #[serde(default)]
    category: Option<String>,
}

impl AddTransactionArgs {
    pub fn new(
        project: impl Into<String>,
        title: impl Into<String>,
        amount: impl Into<String>,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            project: project.into(),
            title: title.into(),
            description: String::new(),
            amount: amount.into(),
            transaction_type,
            date: None,
            category: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub(crate) fn new_transaction(&self) -> NewTransaction {
        NewTransaction {
            title: self.title.clone(),
            description: self.description.clone(),
            amount: self.amount.clone(),
            transaction_type: self.transaction_type,
            date: self.date,
            category: self.category.clone(),
        }
    }
}

/// Args that only identify an entity by id.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdArgs {
    /// The id.
    id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `fintrack category` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoryArgs {
    #[command(subcommand)]
    action: CategoryAction,
}

impl CategoryArgs {
    pub fn action(&self) -> &CategoryAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryAction {
    /// List all categories.
    List,
    /// Add a category.
    Add(AddCategoryArgs),
    /// Delete a category you created. Built-in categories cannot be deleted.
    Delete(IdArgs),
    /// Replace the whole category set with the JSON array in a file, e.g. one produced by
    /// editing the structured output of `category list`.
    Replace(ReplaceCategoriesFileArgs),
}

/// (Not shown): Args for `fintrack category replace`.
#[derive(Debug, Parser, Clone)]
pub struct ReplaceCategoriesFileArgs {
    /// A JSON file holding an array of categories.
    file: PathBuf,
}

impl ReplaceCategoriesFileArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Args for replacing the category set through MCP.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReplaceCategoriesArgs {
    /// The complete new category set. Ids must be unique.
    categories: Vec<Category>,
}

impl ReplaceCategoriesArgs {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

/// Args for adding a category.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddCategoryArgs {
    /// The category name.
    name: String,

    /// A color such as "teal", "rose-400" or "text-amber-700". Unknown colors become gray.
    #[arg(long, default_value = "blue")]
    #[serde(default = "default_color")]
    color: Color,

    /// An icon: briefcase, zap, home, car, coffee, shopping, film, heart, more, and others.
    /// Unknown icons become "more".
    #[arg(long, default_value = "more")]
    #[serde(default)]
    icon: Icon,
}

impl AddCategoryArgs {
    pub fn new(name: impl Into<String>, color: Color, icon: Icon) -> Self {
        Self {
            name: name.into(),
            color,
            icon,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn icon(&self) -> Icon {
        self.icon
    }
}

/// Args for the `fintrack suggest` command.
#[derive(Debug, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuggestArgs {
    /// The transaction title.
    #[arg(long)]
    title: String,

    /// The transaction description.
    #[arg(long, default_value = "")]
    #[serde(default)]
    description: String,
}

impl SuggestArgs {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// (Not shown): Args for the `fintrack mcp` command.
#[derive(Debug, Parser, Clone)]
pub struct McpArgs {}

fn default_color() -> Color {
    Color::new(Hue::Blue)
}

fn default_fintrack_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("fintrack"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --fintrack-home or FINTRACK_HOME instead of relying on the \
                default fintrack home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("fintrack")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction_add() {
        let args = Args::try_parse_from([
            "fintrack",
            "--fintrack-home",
            "/tmp/ft",
            "transaction",
            "add",
            "--project",
            "p1",
            "--title",
            "Salary",
            "--amount",
            "2500",
            "--type",
            "income",
            "--date",
            "2025-02-28",
        ])
        .unwrap();
        assert_eq!(args.common().fintrack_home().path(), Path::new("/tmp/ft"));
        let Command::Transaction(t) = args.command() else {
            panic!("wrong command");
        };
        let TransactionAction::Add(add) = t.action() else {
            panic!("wrong action");
        };
        let input = add.new_transaction();
        assert_eq!(add.project(), "p1");
        assert_eq!(input.transaction_type, TransactionType::Income);
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2025, 2, 28));
        assert!(input.category.is_none());
    }

    #[test]
    fn test_parse_sync_default_direction() {
        let args = Args::try_parse_from(["fintrack", "sync"]).unwrap();
        let Command::Sync(sync) = args.command() else {
            panic!("wrong command");
        };
        assert_eq!(sync.direction(), SyncDirection::Pull);
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_parse_category_add() {
        let args =
            Args::try_parse_from(["fintrack", "category", "add", "Pets", "--color", "teal"])
                .unwrap();
        let Command::Category(c) = args.command() else {
            panic!("wrong command");
        };
        let CategoryAction::Add(add) = c.action() else {
            panic!("wrong action");
        };
        assert_eq!(add.color().token(), "text-teal-500");
        assert_eq!(add.icon(), Icon::More);
    }

    #[test]
    fn test_add_transaction_args_from_json() {
        let json = r#"{"project":"p1","title":"Rent","amount":"900","type":"expense"}"#;
        let args: AddTransactionArgs = serde_json::from_str(json).unwrap();
        assert_eq!(args.new_transaction().amount, "900");
        assert!(args.date.is_none());
    }
}
