use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use docql::{
    Client, Config, DatabaseMeta, DocqlError, DocqlResult, ExplainAdapter, FindManyOptions,
    Method, SharedAdapter, StaticMetadata,
};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docql")]
#[command(about = "DocQL - compile document queries into MongoDB commands", long_about = None)]
struct Cli {
    /// Directory containing docql.toml
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Schema metadata file, used instead of the configuration file
    #[arg(long)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a where condition into a `$expr` filter
    Where(ModelInput),
    /// Compile update instructions into an updateMany command
    Update {
        #[command(flatten)]
        target: ModelInput,
        /// Where condition selecting the records to update
        #[arg(long)]
        filter: Option<String>,
    },
    /// Prepare one document or an array of documents for insertion
    Create(ModelInput),
    /// Compile a where condition into a find command
    Find {
        #[command(flatten)]
        target: ModelInput,
        /// Reference field names or a named join object, as JSON
        #[arg(long)]
        join: Option<String>,
        /// Space separated field names to return
        #[arg(long)]
        select: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct ModelInput {
    /// Model name
    #[arg(short, long)]
    model: String,

    /// JSON input
    #[arg(short, long)]
    input: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (meta, log_filter) = match &cli.schema {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let meta: DatabaseMeta = serde_json::from_str(&content)?;
            (meta, "docql=info".to_string())
        }
        None => {
            let config = Config::load(&cli.config_dir)?;
            (config.load_schema(&cli.config_dir)?, config.log_filter)
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = run(meta, cli.command).await.map_err(report)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run(meta: DatabaseMeta, command: Command) -> DocqlResult<Value> {
    let name = meta.name.clone();
    let client = Client::new(
        Arc::new(StaticMetadata::new().with_database(meta)),
        Arc::new(SharedAdapter(Arc::new(ExplainAdapter::new()))),
    );
    let database = client.database(&name).await?;

    match command {
        Command::Where(target) => {
            let mut action = database.action(&target.model)?;
            action.set_where(&parse(&target.input)?)?;
            Ok(docql::pipeline::filter(action.definition()))
        }
        Command::Update { target, filter } => {
            let mut action = database.action(&target.model)?;
            action.set_method(Method::UpdateMany);
            if let Some(filter) = filter {
                action.set_where(&parse(&filter)?)?;
            }
            action.set_updates(&parse(&target.input)?).await?;
            action.execute().await
        }
        Command::Create(target) => {
            let model = database.model(&target.model)?;
            let data = parse(&target.input)?;
            if data.is_array() {
                model.create_many(&data).await
            } else {
                model.create_one(&data).await
            }
        }
        Command::Find {
            target,
            join,
            select,
            limit,
        } => {
            let model = database.model(&target.model)?;
            let options = FindManyOptions {
                join: join.as_deref().map(parse).transpose()?,
                select: select.map(Value::String),
                limit: limit.map(Value::from),
                ..Default::default()
            };
            model.find_many(&parse(&target.input)?, options).await
        }
    }
}

fn parse(text: &str) -> DocqlResult<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Attach per-field validation issues to the error message
fn report(err: DocqlError) -> anyhow::Error {
    if err.specifics().is_empty() {
        return anyhow::Error::new(err);
    }
    let details = serde_json::to_string_pretty(err.specifics()).unwrap_or_default();
    anyhow::anyhow!("{}\n{}", err, details)
}
