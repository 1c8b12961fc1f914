//! stockpulse command line interface.

use clap::{Parser, Subcommand, ValueEnum};

use stockpulse_core::{SortKey, Timeframe};

mod report;
mod reevaluate;
mod subreddits;
mod track;

#[derive(Debug, Parser)]
#[command(name = "stockpulse")]
#[command(about = "Reddit stock mention and sentiment tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeframeArg {
    Day,
    Week,
    Month,
}

impl From<TimeframeArg> for Timeframe {
    fn from(value: TimeframeArg) -> Self {
        match value {
            TimeframeArg::Day => Timeframe::Day,
            TimeframeArg::Week => Timeframe::Week,
            TimeframeArg::Month => Timeframe::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Mentions,
    Score,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Mentions => SortKey::Mentions,
            SortArg::Score => SortKey::SentimentScore,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track ticker mentions and sentiment across stock subreddits
    Track {
        /// Listing window for top posts
        #[arg(short, long, value_enum, default_value_t = TimeframeArg::Day)]
        timeframe: TimeframeArg,

        /// Subreddit selection, 1-based (e.g. "1", "1-5", "1,3,5", "2-4,8")
        #[arg(short, long)]
        subreddits: Option<String>,

        /// Posts to fetch per subreddit
        #[arg(long, default_value_t = 100)]
        post_limit: usize,

        /// Top comments to fetch per kept post
        #[arg(long, default_value_t = 5)]
        comments_per_post: usize,

        /// Override the configured daily request limit
        #[arg(long)]
        max_requests: Option<u32>,

        /// Rows to print in the final table
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Report ordering
        #[arg(long, value_enum, default_value_t = SortArg::Mentions)]
        sort: SortArg,

        /// Print the subreddit selection and exit without fetching
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-run sentiment extraction over stored raw items for one ticker
    Reevaluate {
        /// Ticker symbol (e.g. AAPL)
        ticker: String,

        #[arg(short, long, value_enum, default_value_t = TimeframeArg::Day)]
        timeframe: TimeframeArg,
    },
    /// Show stored sentiment analyses
    Report {
        #[arg(short, long, value_enum, default_value_t = TimeframeArg::Day)]
        timeframe: TimeframeArg,

        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Show today's request budget
    Budget,
    /// Discard the ticker cache and fetch a fresh symbol list
    RefreshTickers,
    /// List the configured subreddits with selection indexes
    ListSubreddits,
    /// List the model rotation roster
    ListModels,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = stockpulse_core::load_app_config()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Track {
            timeframe,
            subreddits,
            post_limit,
            comments_per_post,
            max_requests,
            top,
            sort,
            dry_run,
        }) => {
            track::run_track(
                &config,
                track::TrackArgs {
                    timeframe: timeframe.into(),
                    selection: subreddits,
                    post_limit,
                    comments_per_post,
                    max_requests,
                    top,
                    sort_key: sort.into(),
                    dry_run,
                },
            )
            .await
        }
        Some(Commands::Reevaluate { ticker, timeframe }) => {
            reevaluate::run_reevaluate(&config, &ticker, timeframe.into()).await
        }
        Some(Commands::Report { timeframe, limit }) => {
            report::run_report(&config, timeframe.into(), limit).await
        }
        Some(Commands::Budget) => report::run_budget(&config).await,
        Some(Commands::RefreshTickers) => {
            let store = stockpulse_tickers::TickerStore::new(&config.ticker_cache_path, 10)?;
            let set = store.force_refresh().await?;
            println!("refreshed ticker set: {} symbols", set.len());
            Ok(())
        }
        Some(Commands::ListSubreddits) => {
            subreddits::print_subreddit_list();
            Ok(())
        }
        Some(Commands::ListModels) => {
            for model in stockpulse_llm::default_models() {
                println!(
                    "{:<50} context {:>9}  priority {}",
                    model.id, model.context_window, model.priority
                );
            }
            Ok(())
        }
        None => {
            println!("stockpulse ready; try `stockpulse track --help`");
            Ok(())
        }
    }
}
