use clap::Parser;
use fintrack::args::{Args, AuthAction, CategoryAction, Command, ProjectAction, TransactionAction};
use fintrack::{commands, App, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().fintrack_home().path();

    // When FINTRACK_IN_TEST_MODE is set and non-empty, Google Drive is replaced by a directory
    // inside the fintrack home.
    let mode = Mode::from_env();

    match args.command() {
        Command::Init(init_args) => {
            return commands::init(home, init_args.client_secret()).await.map(|o| o.print());
        }
        Command::Mcp(_mcp_args) => {
            return commands::mcp(Config::load(home).await?, mode)
                .await
                .map(|o| o.print());
        }
        _ => {}
    }

    let mut app = App::open(Config::load(home).await?, mode).await?;
    let result = run(&mut app, args.command()).await;

    // Edits push to Drive in the background. Wait for those pushes before exiting.
    let settled = app.settle().await;
    result?;
    settled
}

async fn run(app: &mut App, command: &Command) -> Result<()> {
    let _: () = match command {
        Command::Init(_) | Command::Mcp(_) => {}

        Command::Auth(auth_args) => match auth_args.action() {
            AuthAction::Login => commands::login(app).await?.print(),
            AuthAction::Logout => commands::logout(app).await?.print(),
            AuthAction::Status => commands::status(app).await?.print(),
        },

        Command::Sync(sync_args) => commands::sync(app, sync_args.direction()).await?.print(),

        Command::Project(project_args) => match project_args.action() {
            ProjectAction::Create(args) => commands::create_project(app, args).await?.print(),
            ProjectAction::List => commands::list_projects(app).await?.print(),
        },

        Command::Transaction(transaction_args) => match transaction_args.action() {
            TransactionAction::Add(args) => commands::add_transaction(app, args).await?.print(),
            TransactionAction::List(args) => {
                commands::list_transactions(app, args).await?.print()
            }
            TransactionAction::Delete(args) => {
                commands::delete_transaction(app, args).await?.print()
            }
        },

        Command::Category(category_args) => match category_args.action() {
            CategoryAction::List => commands::list_categories(app).await?.print(),
            CategoryAction::Add(args) => commands::add_category(app, args).await?.print(),
            CategoryAction::Delete(args) => commands::delete_category(app, args).await?.print(),
            CategoryAction::Replace(args) => {
                commands::replace_categories_from_file(app, args).await?.print()
            }
        },

        Command::Summary(args) => commands::summary(app, args).await?.print(),
        Command::Analyze(args) => commands::analyze(app, args).await?.print(),
        Command::Suggest(args) => commands::suggest(app, args).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
