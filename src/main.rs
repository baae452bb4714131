use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use ticket_crawler::app::crawl_use_case::{dedupe_preserving_order, CrawlUseCase, ErrorHandlingStrategy};
use ticket_crawler::app::ports::{HttpClientPort, SessionFactory};
use ticket_crawler::config::{CrawlerConfig, DEFAULT_CONFIG_PATH};
use ticket_crawler::infra::http_client::ReqwestHttp;
use ticket_crawler::infra::static_session::StaticHtmlSessionFactory;
use ticket_crawler::infra::webdriver_session::WebDriverSessionFactory;
use ticket_crawler::{logging, CatalogResolver, Category, DetailExtractor, ListingId};

#[derive(Parser)]
#[command(name = "ticket_crawler")]
#[command(about = "Crawls concert and musical listings from the Interpark ticket catalog")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// How detail pages are rendered
    #[arg(long, global = true, value_enum, default_value_t = SessionKind::Webdriver)]
    session: SessionKind,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SessionKind {
    /// Real browser through a WebDriver endpoint
    Webdriver,
    /// Plain fetch of an already rendered page
    Static,
}

#[derive(Subcommand)]
enum Commands {
    /// List the identifiers in the catalog for a category and date
    Catalog {
        /// musical, concert, or a raw KindOfGoods code
        #[arg(long)]
        category: String,
        /// Play date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Drop repeated identifiers
        #[arg(long)]
        unique: bool,
    },
    /// Extract the detail record of one listing
    Detail {
        #[arg(long)]
        id: String,
    },
    /// Extract every listing of a category for a date
    All {
        #[arg(long)]
        category: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Stop at the first listing that fails
        #[arg(long)]
        fail_fast: bool,
    },
    /// Extract the last concert and the last musical of the day (default)
    Run {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn build_use_case(config: &CrawlerConfig, session: SessionKind) -> anyhow::Result<CrawlUseCase> {
    let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(config.catalog.request_timeout())?);
    let sessions: Arc<dyn SessionFactory> = match session {
        SessionKind::Webdriver => Arc::new(WebDriverSessionFactory::new(
            &config.detail.webdriver_url,
            config.detail.headless,
            config.detail.command_timeout(),
        )?),
        SessionKind::Static => Arc::new(StaticHtmlSessionFactory::new(http.clone())),
    };

    Ok(CrawlUseCase::new(
        CatalogResolver::from_config(http, config),
        DetailExtractor::from_config(sessions, config),
    ))
}

fn print_json<T: serde::Serialize>(label: &str, value: &T) -> anyhow::Result<()> {
    println!("{}: {}", label, serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = CrawlerConfig::load_from(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let crawler = build_use_case(&config, cli.session)?;
    let today = Local::now().date_naive();

    match cli.command.unwrap_or(Commands::Run { date: None }) {
        Commands::Catalog { category, date, unique } => {
            let category: Category = category.parse()?;
            let mut ids = crawler.resolver().resolve(date.unwrap_or(today), category).await?;
            if unique {
                ids = dedupe_preserving_order(ids);
            }
            for id in &ids {
                println!("{}", id);
            }
        }
        Commands::Detail { id } => {
            let record = crawler.extractor().extract(&ListingId::new(id)).await?;
            print_json("record", &record)?;
        }
        Commands::All { category, date, fail_fast } => {
            let category: Category = category.parse()?;
            let strategy = if fail_fast {
                ErrorHandlingStrategy::StopOnFirstError
            } else {
                ErrorHandlingStrategy::ContinueOnError
            };
            let report = crawler.crawl_all(date.unwrap_or(today), category, strategy).await?;
            for (id, record) in &report.records {
                print_json(id.as_str(), record)?;
            }
            for (id, reason) in &report.failures {
                error!(listing = %id, "{}", reason);
            }
        }
        Commands::Run { date } => {
            let date = date.unwrap_or(today);
            info!("Running daily crawl for {}", date);
            for category in Category::ALL {
                match crawler.crawl_last(date, category).await? {
                    Some(record) => print_json(category.name(), &record)?,
                    None => println!("{}: no listings", category),
                }
            }
        }
    }

    Ok(())
}
