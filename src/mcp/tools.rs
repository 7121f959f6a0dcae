//! The fintrack MCP tools. Each tool delegates to the matching command handler.

use crate::args::{
    AddCategoryArgs, AddTransactionArgs, CreateProjectArgs, IdArgs, ProjectIdArgs,
    ReplaceCategoriesArgs, SuggestArgs, SyncArgs,
};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::FintrackServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::{info, warn};

#[tool_router(vis = "pub(super)")]
impl FintrackServer {
    #[tool]
    /// Initialize the fintrack MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten the usage
    /// instructions.
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// List all projects with their ids, names, descriptions and currencies.
    #[tool]
    async fn list_projects(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::list_projects(&app).await)
    }

    /// Create a project. Projects group transactions, e.g. a household, a side business or a
    /// trip. Returns the new project including its id.
    #[tool]
    async fn create_project(
        &self,
        Parameters(args): Parameters<CreateProjectArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: create_project called with name={}", args.name());
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::create_project(&mut app, &args).await)
    }

    /// List a project's transactions, newest first.
    #[tool]
    async fn list_transactions(
        &self,
        Parameters(args): Parameters<ProjectIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::list_transactions(&mut app, &args).await)
    }

    /// Add an income or expense transaction to a project.
    ///
    /// `amount` is a positive number such as "12.50"; `type` decides whether it adds to or
    /// subtracts from the balance. When `category` is omitted, a category is suggested from the
    /// title and description, falling back to "other". `date` defaults to today.
    #[tool]
    async fn add_transaction(
        &self,
        Parameters(args): Parameters<AddTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: add_transaction called for project {}", args.project());
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::add_transaction(&mut app, &args).await)
    }

    /// Delete a transaction by id. Returns the deleted transaction.
    #[tool]
    async fn delete_transaction(
        &self,
        Parameters(args): Parameters<IdArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: delete_transaction called with id={}", args.id());
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::delete_transaction(&mut app, &args).await)
    }

    /// List all categories. Use the `id` values when adding transactions.
    #[tool]
    async fn list_categories(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::list_categories(&app).await)
    }

    /// Add a custom category. Returns the new category including its generated id.
    #[tool]
    async fn add_category(
        &self,
        Parameters(args): Parameters<AddCategoryArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: add_category called with name={}", args.name());
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::add_category(&mut app, &args).await)
    }

    /// Delete a custom category by id. Built-in categories cannot be deleted. Transactions that
    /// use the category keep its id.
    #[tool]
    async fn delete_category(
        &self,
        Parameters(args): Parameters<IdArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: delete_category called with id={}", args.id());
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::delete_category(&mut app, &args).await)
    }

    /// Replace the whole category set. Pass every category to keep, including the built-in
    /// ones, with unique ids. Transactions are not changed, so removed ids stay on them.
    #[tool]
    async fn replace_categories(
        &self,
        Parameters(args): Parameters<ReplaceCategoriesArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!(
            "MCP: replace_categories called with {} categories",
            args.categories().len()
        );
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::replace_categories(&mut app, &args).await)
    }

    /// Total income, total expense, balance and the expense breakdown by category for a project.
    #[tool]
    async fn project_summary(
        &self,
        Parameters(args): Parameters<ProjectIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::summary(&app, &args).await)
    }

    /// A short Markdown analysis of a project's finances with one actionable tip. When the
    /// advisor is not configured or fails, the text explains that instead.
    #[tool]
    async fn analyze_project(
        &self,
        Parameters(args): Parameters<ProjectIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: analyze_project called for project {}", args.project());
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::analyze(&app, &args).await)
    }

    /// Suggest the id of the category that best fits a transaction title and description.
    /// Returns "other" when there is no good match or the advisor is unavailable.
    #[tool]
    async fn suggest_category(
        &self,
        Parameters(args): Parameters<SuggestArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        let mut app = self.app.lock().await;
        app.reap().await;
        tool_result(commands::suggest(&app, &args).await)
    }

    /// Sync with Google Drive. Requires a prior `fintrack auth login` on this machine.
    ///
    /// - **pull** (default): replaces local data with the Drive snapshot after saving a backup of
    ///   local data. When there is no snapshot yet, local data is uploaded instead.
    /// - **push**: replaces the Drive snapshot with local data.
    ///
    /// When not logged in, nothing happens and the outcome is "skipped".
    #[tool]
    async fn sync(
        &self,
        Parameters(args): Parameters<SyncArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: sync called with direction={}", args.direction());
        let mut app = self.app.lock().await;
        if let Err(e) = app.settle().await {
            warn!("A background push failed before sync: {e}");
        }
        tool_result(commands::sync(&mut app, args.direction()).await)
    }
}
