//! Bot server lifecycle: startup validation, command-menu registration,
//! the getUpdates long-poll loop, and graceful shutdown.
//!
//! Updates are routed in arrival order, which preserves the username-then-
//! password sequence of a login conversation; routing itself never blocks
//! (replies leave through the writer channel), so one user's traffic cannot
//! stall another's. Transport errors in the poll loop are logged and
//! retried with a short backoff; nothing a single user sends can terminate
//! the loop.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;

use super::commands;
use super::credentials::CredentialStore;
use super::router::Router;
use crate::config::Config;
use crate::telegram::{self, BotCommand, OutgoingAction, TelegramClient, TextEvent};

/// Delay before retrying after a failed getUpdates call.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct BotServer {
    config: Config,
    client: TelegramClient,
    router: Router,
    outgoing_rx: Option<mpsc::UnboundedReceiver<OutgoingAction>>,
}

impl std::fmt::Debug for BotServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotServer")
            .field("config", &self.config)
            .field(
                "outgoing_rx_present",
                &self.outgoing_rx.is_some(),
            )
            .finish_non_exhaustive()
    }
}

impl BotServer {
    /// Build the server from loaded configuration.
    ///
    /// Fails fast when no bot token is configured - the process must not
    /// reach the polling loop without one.
    pub fn new(config: Config) -> Result<Self> {
        let token = config.telegram.resolve_token()?;
        let client = TelegramClient::new(&token, config.telegram.request_timeout_seconds);

        let credentials = CredentialStore::new(config.credentials.clone());
        if credentials.is_empty() {
            warn!("Credential table is empty; nobody will be able to log in");
        } else {
            info!("Loaded {} credential(s)", credentials.len());
        }

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let router = Router::new(
            config.bot.name.clone(),
            credentials,
            commands::default_registry(),
            outgoing_tx,
        );

        Ok(Self {
            config,
            client,
            router,
            outgoing_rx: Some(outgoing_rx),
        })
    }

    /// The command list registered with Telegram at startup.
    pub fn command_menu(&self) -> Vec<BotCommand> {
        commands::command_menu(self.router.command_registry())
    }

    /// Run until Ctrl+C.
    pub async fn run(&mut self) -> Result<()> {
        let me = self
            .client
            .get_me()
            .await
            .context("Telegram rejected the configured bot token")?;
        info!(
            "Authorized as @{} (id {})",
            me.username.as_deref().unwrap_or("unknown"),
            me.id
        );

        // Menu registration is cosmetic; a failure should not stop startup.
        match self.client.set_my_commands(&self.command_menu()).await {
            Ok(()) => info!("Registered command menu"),
            Err(e) => warn!("Could not register command menu: {}", e),
        }

        let outgoing_rx = self
            .outgoing_rx
            .take()
            .context("server is already running")?;
        let writer = telegram::start_writer(self.client.clone(), outgoing_rx);

        info!("Bot is running; press Ctrl+C to stop");
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let poll_timeout = self.config.telegram.poll_timeout_seconds;
        let mut offset: i64 = 0;
        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Shutdown requested");
                    break;
                }
                polled = self.client.get_updates(offset, poll_timeout) => match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Some(ev) = TextEvent::from_update(update) {
                                // Content stays out of the log: mid-login it
                                // may be a password.
                                debug!(
                                    "Dispatching message {} from user {}",
                                    ev.message_id, ev.user_id
                                );
                                self.router.handle_event(&ev);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("getUpdates failed: {}; retrying", e);
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                    }
                }
            }
        }

        writer.abort();
        info!("Bot server shutdown complete");
        Ok(())
    }
}
