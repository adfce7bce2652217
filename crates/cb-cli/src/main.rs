use anyhow::{anyhow, Result};
use cb_contacts::payload::ContactsPayload;
use cb_contacts::{ContactFilter, ContactSelection};
use clap::{Args, Parser, Subcommand};

const CLI_NAME: &str = "cb-cli";

#[derive(Parser)]
#[command(name = "cb", version, about = "Circles contact aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the contacts HTTP API
    Contacts,
    /// Apply database migrations
    Migrate,
    /// Aggregate the contacts of one subject and print them as JSON
    Aggregate(AggregateArgs),
}

#[derive(Args, Clone)]
struct AggregateArgs {
    /// Subject address
    #[arg(long)]
    subject: String,

    /// Contact point to query; repeatable. Defaults to CONTACTS_DEFAULT_SOURCES or all
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Only report these counterparties; repeatable
    #[arg(long = "address")]
    addresses: Vec<String>,

    /// Pretty-print JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Contacts => {
            let config = cb_contacts::load_config()?;
            cb_contacts::run(config).await?;
        }
        Commands::Migrate => {
            cb_core::logging::init(CLI_NAME);
            let database_url = cb_core::config::required_env("DATABASE_URL")?;
            let pool = cb_core::db::connect(&database_url, 1).await?;
            cb_core::migrations::run(&pool).await?;
            tracing::info!("migrations applied");
        }
        Commands::Aggregate(args) => {
            cb_core::logging::init(CLI_NAME);
            let config = cb_contacts::load_config()?;
            let (aggregator, _, _) = cb_contacts::connect_aggregator(&config).await?;

            let subject = args.subject.trim();
            if subject.is_empty() {
                return Err(anyhow!("subject is empty"));
            }
            let selection = if args.sources.is_empty() {
                config.default_selection()
            } else {
                ContactSelection::from_names(&args.sources)
            };
            let filter = if args.addresses.is_empty() {
                ContactFilter::unrestricted()
            } else {
                ContactFilter::addresses(&args.addresses)
            };

            let result = aggregator.aggregate(subject, &selection, &filter).await?;
            let output = ContactsPayload::from(&result);
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{rendered}");
        }
    }

    Ok(())
}
