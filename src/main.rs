//! Binary entrypoint for the wandering-collector CLI.
//!
//! Commands:
//! - `init` - write a default configuration file
//! - `status` - list owners with stored records
//! - `inspect <owner> [--now <tick>]` - show an owner's stored records with price and expiry
//! - `quote <descriptor-json>` - price an item descriptor and show its offer cost
//!
//! See the library crate docs for module-level details: `wandering_collector::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use wandering_collector::collector::{
    is_expired, offer_costs, CollectorStore, CollectorStoreBuilder, ItemDescriptor, LootStore,
    ServiceSettings,
};
use wandering_collector::config::Config;
use wandering_collector::logutil::{escape_log, short_id};
use wandering_collector::validation::validate_uuid;

#[derive(Parser)]
#[command(name = "wandering-collector")]
#[command(about = "Inspect and price the lost item economy")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "collector.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// List owners with stored records
    Status,
    /// Show one owner's stored records
    Inspect {
        /// Owner UUID
        owner: String,
        /// Game tick used to report expiry
        #[arg(long)]
        now: Option<i64>,
    },
    /// Price an item descriptor given as JSON
    Quote {
        /// e.g. '{"item_id":"minecraft:diamond","count":3,"category":{"ingot":"diamond"},"max_stack_size":64}'
        descriptor: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new collector configuration");
            if Path::new(&cli.config).exists() {
                return Err(anyhow!(
                    "Config file {} already exists; remove it first",
                    cli.config
                ));
            }
            Config::create_default(&cli.config)?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = load_or_default(pre_config, &cli.config);
            let store = open_store(&config)?;
            let owners = store.list_owners()?;
            println!("Wandering Collector v{}", env!("CARGO_PKG_VERSION"));
            println!("Store: {}", store_path(&config).display());
            println!("Owners with records: {}", owners.len());
            for owner in owners {
                println!("  {}  {} record(s)", owner, store.count_records(&owner));
            }
        }
        Commands::Inspect { owner, now } => {
            let config = load_or_default(pre_config, &cli.config);
            let owner = validate_uuid(&owner)
                .ok_or_else(|| anyhow!("'{}' is not a valid owner UUID", escape_log(&owner)))?;
            let settings = ServiceSettings::from_config(&config);
            let store = open_store(&config)?;
            let records = store.load_records(&owner)?;

            println!("{} record(s) for {}", records.len(), owner);
            for record in records {
                let price = settings.pricing.price(&record.descriptor);
                let state = match now {
                    Some(now) if is_expired(&record, now, settings.disposal_window) => "expired",
                    Some(_) => "live",
                    None => "-",
                };
                println!(
                    "  {}  {} x{}  price {}  created {}  {}",
                    short_id(record.id.as_uuid()),
                    record.descriptor.item_id,
                    record.descriptor.count,
                    price,
                    record.created_at,
                    state
                );
            }
        }
        Commands::Quote { descriptor } => {
            let config = load_or_default(pre_config, &cli.config);
            let descriptor: ItemDescriptor = serde_json::from_str(&descriptor)
                .map_err(|e| anyhow!("Failed to parse item descriptor: {}", e))?;
            let settings = ServiceSettings::from_config(&config);
            let price = settings.pricing.price(&descriptor);
            let (primary, secondary) = offer_costs(price);

            println!("{} x{}", descriptor.item_id, descriptor.count);
            println!("  valuable: {}", settings.pricing.is_valuable(&descriptor));
            println!("  price:    {}", price);
            match secondary {
                Some(extra) => println!(
                    "  offer:    {} {:?} + {} {:?}",
                    primary.amount, primary.currency, extra.amount, extra.currency
                ),
                None => println!("  offer:    {} {:?}", primary.amount, primary.currency),
            }
        }
    }

    Ok(())
}

fn load_or_default(pre_config: Option<Config>, path: &str) -> Config {
    pre_config.unwrap_or_else(|| {
        warn!("Could not load {}, using default configuration", path);
        Config::default()
    })
}

fn store_path(config: &Config) -> PathBuf {
    Path::new(&config.storage.data_dir).join("collector")
}

fn open_store(config: &Config) -> Result<CollectorStore> {
    let path = store_path(config);
    CollectorStoreBuilder::new(&path)
        .open()
        .map_err(|e| anyhow!("Failed to open store at {}: {}", path.display(), e))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let configured = config
        .as_ref()
        .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only in the foreground
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
