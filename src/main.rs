//! s3wal - Append-Only Log on Object Storage
//!
//! Operator CLI for appending to, reading from and recovering a log
//! described by a configuration file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3wal::config::S3WalConfig;
use s3wal::wal::{ObjectWal, Offset, Record};

/// s3wal - Append-only log on object storage
#[derive(Parser)]
#[command(name = "s3wal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "s3wal.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "s3wal.toml")]
        output: PathBuf,

        /// Namespace prefix for the log
        #[arg(long, default_value = "log")]
        prefix: String,

        /// Root directory of the local object store
        #[arg(long, default_value = "/var/lib/s3wal")]
        path: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Append one record
    Append {
        /// Payload text
        #[arg(short, long, conflicts_with = "file")]
        data: Option<String>,

        /// Read the payload from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Recover the frontier and retry if the offset is taken
        #[arg(long)]
        retry: bool,
    },

    /// Read the record at an offset
    Read {
        offset: Offset,

        /// Print the payload as hex instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Recover the log frontier and print the last record
    Last {
        /// Print the payload as hex instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output, prefix, path } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"), "pretty");
            run_init(output, prefix, path)
        }
        command => {
            let config = S3WalConfig::from_file(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?;
            let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
            init_logging(level, &config.logging.format);
            run_command(command, config).await
        }
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_command(command: Commands, config: S3WalConfig) -> anyhow::Result<()> {
    match command {
        Commands::Init { .. } => anyhow::bail!("init writes a new configuration and cannot run against a loaded one"),
        Commands::Validate => run_validate(&config),
        Commands::Append { data, file, retry } => {
            let payload = match (data, file) {
                (Some(text), None) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("reading payload from {}", path.display()))?,
                (None, None) => anyhow::bail!("one of --data or --file is required"),
                (Some(_), Some(_)) => anyhow::bail!("--data and --file are mutually exclusive"),
            };
            run_append(&config, &payload, retry).await
        }
        Commands::Read { offset, hex } => {
            let wal = ObjectWal::from_config(&config)?;
            let record = wal.read(offset).await?;
            print_record(&record, hex)
        }
        Commands::Last { hex } => {
            let wal = ObjectWal::from_config(&config)?;
            let record = wal.last_record().await?;
            print_record(&record, hex)
        }
    }
}

async fn run_append(config: &S3WalConfig, payload: &[u8], retry: bool) -> anyhow::Result<()> {
    let wal = ObjectWal::from_config(config)?;

    // A fresh process knows nothing about the frontier
    match wal.last_record().await {
        Ok(_) | Err(s3wal::Error::EmptyLog { .. }) => {}
        Err(e) => return Err(e).context("recovering log frontier"),
    }

    let offset = if retry {
        wal.append_with_retry(payload, &config.retry_policy()).await?
    } else {
        wal.append(payload).await?
    };

    tracing::info!(prefix = wal.prefix(), offset, "Record appended");
    println!("{}", offset);
    Ok(())
}

fn print_record(record: &Record, as_hex: bool) -> anyhow::Result<()> {
    eprintln!("offset {} ({} bytes)", record.offset, record.data.len());
    let mut stdout = std::io::stdout().lock();
    if as_hex {
        writeln!(stdout, "{}", hex::encode(&record.data))?;
    } else {
        stdout.write_all(&record.data)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Write a default configuration file
fn run_init(output: PathBuf, prefix: String, path: PathBuf) -> anyhow::Result<()> {
    let config_content = format!(
        r#"# s3wal Configuration
# Generated configuration file

[log]
prefix = "{prefix}"

[storage]
backend = "local"
path = "{path}"

[append]
max_attempts = 5
base_backoff_ms = 20
max_backoff_ms = 1000

[logging]
level = "info"
format = "pretty"
"#,
        prefix = prefix,
        path = path.display()
    );

    // Refuse to write something we could not load back
    S3WalConfig::from_str(&config_content)?;

    std::fs::write(&output, config_content)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("✓ Configuration written to {}", output.display());
    Ok(())
}

/// Validate configuration file
fn run_validate(config: &S3WalConfig) -> anyhow::Result<()> {
    println!("✓ Configuration is valid");
    println!("  Prefix:         {}", config.prefix());
    println!("  Backend:        {:?}", config.storage.backend);
    if let Some(path) = &config.storage.path {
        println!("  Path:           {}", path.display());
    }
    println!("  Max Attempts:   {}", config.append.max_attempts);
    Ok(())
}
