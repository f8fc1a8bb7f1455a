use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use tidecast::config::{self, Config};
use tidecast::delivery::{Deliverer, FeedDeliverer, LetterDeliverer};
use tidecast::history::{self, HistoryStore, JsonlHistoryStore, SqliteHistoryStore};
use tidecast::producer::LlmProducer;
use tidecast::{ContentKind, ContentRequest, Orchestrator, ReqwestHttpClient};

#[derive(Parser, Debug)]
#[command(name = "tidecast", version, about = "Ocean advocacy content pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one generation/delivery/record pass over the configured audiences
    Run {
        /// Delivery channel
        #[arg(long, value_enum, default_value_t = ChannelArg::Letters)]
        channel: ChannelArg,
        /// History backend
        #[arg(long, value_enum, default_value_t = HistoryArg::Sqlite)]
        history: HistoryArg,
        /// Directory for letters and run reports
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List the configured audience profiles
    Profiles,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChannelArg {
    /// Post to the social feed
    Feed,
    /// Write advocacy letters to the output directory
    Letters,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HistoryArg {
    Sqlite,
    Jsonl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Profiles => {
            for profile in config::letter_profiles().iter().chain([config::feed_profile()].iter()) {
                println!("{}\t{}\t{}", profile.name, profile.tone, profile.call_to_action);
            }
            Ok(())
        }
        Commands::Run {
            channel,
            history,
            output_dir,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            run(config, channel, history).await
        }
    }
}

async fn run(config: Config, channel: ChannelArg, history: HistoryArg) -> anyhow::Result<()> {
    let reading = tidecast::sources::sample_reading();
    tracing::info!(
        index = reading.index,
        severity = %reading.severity,
        region = %reading.region,
        "Current marine reading"
    );

    let (kind, profiles) = match channel {
        ChannelArg::Feed => (ContentKind::Post, vec![config::feed_profile()]),
        ChannelArg::Letters => (ContentKind::Letter, config::letter_profiles()),
    };

    let subject = reading.to_subject_data();
    let requests: Vec<ContentRequest> = profiles
        .into_iter()
        .map(|profile| ContentRequest::new(kind, subject.clone(), profile))
        .collect();

    let http = Arc::new(ReqwestHttpClient::new());
    let producer = Arc::new(LlmProducer::new(http.clone(), config.generation.clone()));

    let deliverer: Arc<dyn Deliverer> = match channel {
        ChannelArg::Feed => Arc::new(FeedDeliverer::new(http.clone(), config.feed.clone())),
        ChannelArg::Letters => Arc::new(LetterDeliverer::new(config.output_dir.clone())),
    };

    let store: Arc<dyn HistoryStore> = match history {
        HistoryArg::Sqlite => Arc::new(SqliteHistoryStore::connect(&config.history_db).await?),
        HistoryArg::Jsonl => Arc::new(JsonlHistoryStore::new(config.history_jsonl.clone())),
    };

    let orchestrator = Orchestrator::new(producer, deliverer, store);
    let report = orchestrator.run(requests).await;

    for entry in &report.entries {
        println!(
            "{}\t{}\tdelivered={}\tpersisted={}",
            entry.record.content.request.audience.name,
            entry.record.content.origin,
            entry.record.outcome.succeeded,
            entry.persisted,
        );
    }

    let report_path = history::write_report(&report, &config.output_dir).await?;
    println!("report written to {}", report_path.display());

    if report.persistence_failure_count() > 0 {
        tracing::warn!(
            failures = report.persistence_failure_count(),
            "Some history records did not reach durable storage; see the batch report"
        );
    }

    Ok(())
}
