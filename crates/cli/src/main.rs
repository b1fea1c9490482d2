use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "callsync")]
#[command(about = "Telegram to Notion call-summary bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: CALLSYNC_CONFIG_PATH or ~/.callsync/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the bot: long-poll Telegram and mirror call summaries into Notion.
    Run {
        /// Config file path (default: CALLSYNC_CONFIG_PATH or ~/.callsync/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("callsync {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run { config }) => {
            if let Err(e) = run_bot(config).await {
                log::error!("run failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_bot(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let creds = lib::config::resolve_credentials(&config)?;

    let notion = lib::notion::NotionClient::new(creds.notion_token, config.notion.api_base.clone());
    let matcher = lib::directory::DirectoryMatcher::new(
        notion.clone(),
        creds.database_id,
        &config.notion.properties,
    );
    let mutator = lib::mutate::RecordMutator::new(notion, config.notion.properties.clone());
    let store = Arc::new(lib::ingest::NotionStore::new(matcher, mutator));

    let resolver = lib::resolve::TitleResolver::new(&config.matcher.anchor)?;
    let telegram = Arc::new(lib::channels::TelegramChannel::new(creds.telegram_token));
    let controller = lib::ingest::IngestionController::new(
        resolver,
        store,
        Some(telegram.clone() as Arc<dyn lib::ingest::InviteLinkSource>),
    );

    let (inbound_tx, inbound_rx) = tokio::sync::mpsc::channel(64);
    let poll_handle = telegram.clone().start_inbound(inbound_tx);

    log::info!("callsync running (anchor \"{}\")", config.matcher.anchor);
    tokio::select! {
        _ = controller.run(inbound_rx) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("shutdown signal received");
        }
    }
    telegram.stop();
    poll_handle.abort();
    Ok(())
}
