//! Binary entrypoint for the Gatebot CLI.
//!
//! Commands:
//! - `start` - run the bot (long-polls the Telegram API until Ctrl+C)
//! - `init` - create a starter `config.toml` with demo credentials
//!
//! The bot token comes from the `TELEGRAM_BOT_TOKEN` environment variable
//! or the `[telegram].token` config field; without one, `start` exits
//! before polling begins.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use gatebot::bot::BotServer;
use gatebot::config::Config;

#[derive(Parser)]
#[command(name = "gatebot")]
#[command(about = "A session-gated command bot for Telegram")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start,
    /// Initialize a new configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            info!("Starting Gatebot v{}", env!("CARGO_PKG_VERSION"));

            let mut server = BotServer::new(config)?;
            server.run().await?;
        }
        Commands::Init => {
            init_logging(None, cli.verbose);
            if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                anyhow::bail!(
                    "{} already exists; remove it first to re-initialize",
                    cli.config
                );
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            println!(
                "Created {}. Edit the [credentials] table, then set TELEGRAM_BOT_TOKEN and run: gatebot start",
                cli.config
            );
        }
    }

    Ok(())
}

/// Configure env_logger: UTC timestamps, level from CLI verbosity (falling
/// back to the config level), optional log file, and a separate security
/// audit file fed by `target: "security"` records.
fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();

    let base_level = match verbosity {
        0 => config
            .map(|c| c.logging.level.parse().unwrap_or(log::LevelFilter::Info))
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.and_then(|c| c.logging.file.clone());
    let security_file = config.and_then(|c| c.logging.security_file.clone());

    if let Some(path) = log_file {
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => {
                let sink = std::sync::Arc::new(std::sync::Mutex::new(f));
                // When stdout is not a TTY (service mode, redirected output)
                // the file is the only destination, avoiding duplicate lines.
                let is_tty = atty::is(atty::Stream::Stdout);
                builder.format(move |fmt, record| {
                    let line = format_record(record);
                    if let Ok(mut guard) = sink.lock() {
                        let _ = writeln!(guard, "{}", line);
                    }
                    if record.target() == "security" {
                        if let Some(ref sec_path) = security_file {
                            if let Ok(mut sf) = std::fs::OpenOptions::new()
                                .create(true)
                                .append(true)
                                .open(sec_path)
                            {
                                let _ = writeln!(sf, "{}", line);
                            }
                        }
                    }
                    if is_tty {
                        writeln!(fmt, "{}", line)
                    } else {
                        Ok(())
                    }
                });
            }
            Err(e) => {
                eprintln!("Could not open log file {}: {}", path, e);
                builder.format(|fmt, record| writeln!(fmt, "{}", format_record(record)));
            }
        }
    } else {
        builder.format(|fmt, record| writeln!(fmt, "{}", format_record(record)));
    }

    let _ = builder.try_init();
}

fn format_record(record: &log::Record<'_>) -> String {
    format!(
        "{} [{}] {}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        record.level(),
        record.args()
    )
}
