// notifier/telegram/command_handler.rs

use crate::model::Candidate;
use crate::notifier::telegram::sender::caption;
use crate::notifier::telegram::TelegramNotifier;
use crate::pipeline;
use crate::utils::squash_whitespace;
use tracing::{info, warn};

const PREVIEW_LINES: usize = 20;

const HELP: &str = "📋 Available commands:\n\
    /ping — check connection\n\
    /status — watcher status\n\
    /help — command list\n\
    /last — last stored candidate\n\
    /count — number of stored candidates\n\
    /preview — scrape the site without saving\n\
    /refresh — run a scrape cycle now\n\
    /uptime — service uptime";

/// "/cmd@BotName args" → "/cmd"
fn command_name(text: &str) -> &str {
    let first = text.split_whitespace().next().unwrap_or("");
    first.split('@').next().unwrap_or(first)
}

fn format_uptime(secs: u64) -> String {
    format!(
        "⏱ Uptime: {:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

fn preview_summary(candidates: &[Candidate]) -> String {
    let mut msg = format!("🔎 {} candidate(s) listed on the site", candidates.len());
    for c in candidates.iter().take(PREVIEW_LINES) {
        msg.push_str(&format!(
            "\n{} · {} · {}",
            c.species,
            c.id,
            squash_whitespace(&c.name)
        ));
    }
    if candidates.len() > PREVIEW_LINES {
        msg.push_str(&format!("\n… and {} more", candidates.len() - PREVIEW_LINES));
    }
    msg
}

/// Handles an incoming command and replies to the chat it came from.
pub async fn handle_command(command_text: &str, chat_id: &str, notifier: &TelegramNotifier) {
    info!("Handling command: {}", command_text);
    let reply = match command_name(command_text) {
        "/ping" => "✅ I am online!".to_string(),
        "/status" => format!(
            "📊 Watcher is running. Next scrape within {}s.",
            notifier.config.check_interval_seconds
        ),
        "/help" | "/start" => HELP.to_string(),
        "/refresh" => {
            info!("/refresh command received, triggering refresh...");
            notifier.refresh_notify.notify_one();
            "🔄 Scrape cycle triggered.".to_string()
        }
        "/uptime" => format_uptime(notifier.start_time.elapsed().as_secs()),
        "/last" => match notifier.storage.lock().await.last_candidate() {
            Ok(Some(candidate)) => format!("🕵️ Last candidate:\n{}", caption(&candidate)),
            Ok(None) => "ℹ️ No candidates stored yet.".to_string(),
            Err(e) => {
                warn!("/last error: {:?}", e);
                "❌ Cannot read the database.".to_string()
            }
        },
        "/count" => match notifier.storage.lock().await.count() {
            Ok(n) => format!("🐾 {} candidate(s) stored.", n),
            Err(e) => {
                warn!("/count error: {:?}", e);
                "❌ Cannot read the database.".to_string()
            }
        },
        "/preview" => match pipeline::preview(&notifier.fetcher, &notifier.config).await {
            Ok(candidates) => preview_summary(&candidates),
            Err(e) => {
                warn!("/preview error: {}", e);
                format!("❌ Error: {}", e)
            }
        },
        _ => "🤖 Unknown command. Try /help.".to_string(),
    };

    if let Err(e) = notifier.notify_text(chat_id, &reply).await {
        warn!("{} reply error: {:?}", command_text, e);
    }
}
