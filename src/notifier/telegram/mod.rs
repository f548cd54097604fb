pub mod command_handler;
pub mod listener;
pub mod sender;

use crate::config::AppConfig;
use crate::model::{Candidate, NotifyError};
use crate::notifier::dispatcher::NotificationSink;
use crate::scraper::HttpFetcher;
use crate::storage::SqliteStorage;
use reqwest::Client;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};

pub struct TelegramNotifier {
    pub bot_token: String,
    pub client: Client,
    pub offset: Arc<AtomicI64>,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub config: Arc<AppConfig>,
    pub fetcher: HttpFetcher,
    pub start_time: Instant,
    pub refresh_notify: Arc<Notify>,
}

impl TelegramNotifier {
    pub fn new(
        config: Arc<AppConfig>,
        storage: Arc<Mutex<SqliteStorage>>,
        fetcher: HttpFetcher,
        refresh_notify: Arc<Notify>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(35))
            .build()
            .map_err(|e| NotifyError::Api(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            bot_token: config.telegram_bot_token.clone(),
            client,
            offset: Arc::new(AtomicI64::new(0)),
            storage,
            config,
            fetcher,
            start_time: Instant::now(),
            refresh_notify,
        })
    }

    pub(crate) fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    /// Chat that receives operational messages (startup, command replies by default).
    pub fn ops_chat_id(&self) -> &str {
        self.config
            .admin_chat_id
            .as_deref()
            .unwrap_or(&self.config.error_chat_id)
    }

    pub async fn notify_text(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, chat_id, text).await
    }

    pub async fn listen_for_commands(&self) {
        listener::listen_for_commands(self).await;
    }

    pub async fn set_my_commands(&self) -> Result<(), reqwest::Error> {
        let commands = serde_json::json!({
            "commands": [
                { "command": "ping", "description": "Check connection" },
                { "command": "status", "description": "Show watcher status" },
                { "command": "help", "description": "Command list" },
                { "command": "last", "description": "Show last stored candidate" },
                { "command": "count", "description": "Number of stored candidates" },
                { "command": "preview", "description": "Scrape the site without saving" },
                { "command": "refresh", "description": "Run a scrape cycle now" },
                { "command": "uptime", "description": "Service uptime" }
            ]
        });
        self.client
            .post(self.api_url("setMyCommands"))
            .json(&commands)
            .send()
            .await?;
        Ok(())
    }

    pub fn spawn_listener(notifier: Arc<TelegramNotifier>) {
        tokio::spawn(async move {
            tracing::info!("▶️ Starting Telegram listener...");
            notifier.listen_for_commands().await;
            tracing::info!("🛑 Telegram listener ended.");
        });
    }
}

#[async_trait::async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send_candidate(&self, chat_id: &str, candidate: &Candidate) -> Result<(), NotifyError> {
        sender::send_photo(self, chat_id, candidate).await
    }

    async fn send_error(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, &self.config.error_chat_id, text).await
    }
}
