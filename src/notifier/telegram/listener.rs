// notifier/telegram/listener.rs

use crate::notifier::telegram::command_handler::handle_command;
use crate::notifier::telegram::TelegramNotifier;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    result: Vec<TelegramUpdate>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// Only the admin chat may command the bot; without one every chat may.
fn is_allowed(admin_chat_id: Option<&str>, chat_id: i64) -> bool {
    match admin_chat_id {
        Some(admin) => admin == chat_id.to_string(),
        None => true,
    }
}

/// Polls for Telegram updates and processes incoming commands.
pub async fn listen_for_commands(notifier: &TelegramNotifier) {
    let url = notifier.api_url("getUpdates");
    loop {
        let current_offset = notifier.offset.load(Ordering::SeqCst);
        let response = notifier
            .client
            .get(&url)
            .query(&[("offset", current_offset.to_string())])
            .send()
            .await;
        match response {
            Ok(resp) => match resp.json::<TelegramApiResponse>().await {
                Ok(api_response) => {
                    for update in api_response.result {
                        if let Some(message) = &update.message {
                            if let Some(text) = message.text.as_deref() {
                                if is_allowed(notifier.config.admin_chat_id.as_deref(), message.chat.id) {
                                    handle_command(text, &message.chat.id.to_string(), notifier).await;
                                } else {
                                    debug!("Ignoring command from chat {}", message.chat.id);
                                }
                            }
                        }
                        notifier.offset.store(update.update_id + 1, Ordering::SeqCst);
                    }
                }
                Err(e) => debug!("Cannot decode getUpdates response: {}", e),
            },
            Err(e) => warn!("getUpdates failed: {}", e),
        }
        sleep(Duration::from_secs(1)).await;
    }
}
