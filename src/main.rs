mod cli;
mod config;
mod form;
mod record;
mod render;
mod storage;
mod store;
mod validate;

use anyhow::{anyhow, Result};
use clap::Parser;
use config::StorageBackend;
use std::path::PathBuf;
use storage::{FileStorage, MemoryStorage, Storage};
use store::RecordStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roster", about = "Employee record manager")]
pub struct Args {
    #[arg(short, long, help = "Run one command (e.g. \"/list\") and exit")]
    pub command: Option<String>,

    #[arg(long, env = "ROSTER_DATA_DIR", help = "Directory for stored records")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Storage key (default: employeeData)")]
    pub key: Option<String>,

    #[arg(long, help = "Keep records in memory only for this session")]
    pub memory: bool,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Delete without asking for confirmation")]
    pub yes: bool,

    #[arg(long, help = "Print the employee table and exit")]
    pub list: bool,

    #[arg(long, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Debug logging")]
    pub debug: bool,
}

fn init_logging(args: &Args, cfg: &config::Config) {
    // RUST_LOG wins over flags and config
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if args.debug {
            "debug"
        } else if args.verbose {
            "info"
        } else {
            cfg.log.level()
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_storage(cfg: &config::Config) -> Result<Box<dyn Storage>> {
    match cfg.storage.backend() {
        StorageBackend::Memory => Ok(Box::new(MemoryStorage::new())),
        StorageBackend::File => {
            let storage = FileStorage::open(&cfg.storage.resolve_data_dir())?;
            info!(dir = %storage.dir().display(), "using file storage");
            Ok(Box::new(storage))
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load()?
    };

    // CLI overrides
    if let Some(dir) = &args.data_dir {
        cfg.storage.data_dir = Some(dir.clone());
    }
    if let Some(key) = &args.key {
        cfg.storage.key = Some(key.clone());
    }
    if args.memory {
        cfg.storage.backend = Some(StorageBackend::Memory);
    }
    if args.yes {
        cfg.confirm_delete = Some(false);
    }

    if let Err(errors) = cfg.validate() {
        let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(anyhow!("Invalid configuration:\n  {}", details.join("\n  ")));
    }

    init_logging(&args, &cfg);
    info!(
        backend = cfg.storage.backend().as_str(),
        key = cfg.storage.key(),
        "starting roster"
    );

    let storage = open_storage(&cfg)?;
    let store = RecordStore::open(storage, cfg.storage.key());

    if args.list {
        print!("{}", render::format_table(store.records()));
        return Ok(());
    }

    let mut ctx = cli::Context::new(store, cfg.confirm_delete());
    if cfg.storage.backend() == StorageBackend::File {
        ctx.history_path = Some(cfg.storage.resolve_data_dir().join("history.txt"));
    }

    if let Some(command) = &args.command {
        cli::run_once(&ctx, command)
    } else {
        cli::run_repl(ctx)
    }
}
