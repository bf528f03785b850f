use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use notion_sheets::client::{NotionClient, resolve_api_key};
use notion_sheets::io::{excel_read, excel_write};
use notion_sheets::sync::{self, ErrorPolicy, UploadOptions};
use notion_sheets::{Result, SyncError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    match cli.command {
        Command::Pull(args) => execute_pull(args).await,
        Command::Push(args) => execute_push(args).await,
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|err| SyncError::Logging(err.to_string()))
}

async fn execute_pull(args: PullArgs) -> Result<()> {
    let client = build_client(args.api_key.as_deref())?;
    let result = sync::load(&client, &args.url).await?;
    if result.has_more {
        warn!("the database holds more records than a single query returns; the workbook is partial");
    }
    excel_write::write_frame(&args.output, &result.frame, Some(&result.schema))?;
    info!(rows = result.frame.len(), output = %args.output.display(), "workbook written");
    Ok(())
}

async fn execute_push(args: PushArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(SyncError::MissingInput(args.input));
    }

    let client = build_client(args.api_key.as_deref())?;
    let (frame, schema) = excel_read::read_frame(&args.input)?;

    let options = UploadOptions {
        schema,
        title: args.title.unwrap_or_default(),
        title_column: args.title_column,
        errors: args.errors.into(),
        ..UploadOptions::default()
    };

    let url = sync::upload(&client, &frame, &args.url, options).await?;
    println!("The workbook has been uploaded to the Notion database: {url}");
    Ok(())
}

fn build_client(api_key: Option<&str>) -> Result<NotionClient> {
    NotionClient::new(&resolve_api_key(api_key)?)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Round-trip Notion databases and spreadsheet data sets."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a Notion database into an Excel workbook.
    Pull(PullArgs),
    /// Upload an Excel workbook into a Notion database or page.
    Push(PushArgs),
}

#[derive(clap::Args)]
struct PullArgs {
    /// URL of the Notion database view to download.
    #[arg(long)]
    url: String,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Integration token. Falls back to the NOTION_API_KEY environment
    /// variable.
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(clap::Args)]
struct PushArgs {
    /// Input workbook path.
    #[arg(long)]
    input: PathBuf,

    /// URL of the target database view, or of a page under which a new
    /// database is created.
    #[arg(long)]
    url: String,

    /// Title given to a newly created database.
    #[arg(long)]
    title: Option<String>,

    /// Column treated as the title column when the schema is inferred.
    #[arg(long)]
    title_column: Option<String>,

    /// How to handle rows that fail to upload.
    #[arg(long, value_enum, default_value = "strict")]
    errors: ErrorsArg,

    /// Integration token. Falls back to the NOTION_API_KEY environment
    /// variable.
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ErrorsArg {
    Strict,
    Warn,
    Ignore,
}

impl From<ErrorsArg> for ErrorPolicy {
    fn from(value: ErrorsArg) -> Self {
        match value {
            ErrorsArg::Strict => ErrorPolicy::Strict,
            ErrorsArg::Warn => ErrorPolicy::Warn,
            ErrorsArg::Ignore => ErrorPolicy::Ignore,
        }
    }
}
