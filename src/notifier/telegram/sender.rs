// notifier/telegram/sender.rs

use crate::model::{Candidate, NotifyError};
use crate::notifier::telegram::TelegramNotifier;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Photo caption: one labelled line per field, then the detail page link.
pub fn caption(candidate: &Candidate) -> String {
    format!(
        "編號:    {}\n名稱:    {}\n品種:    {}\n性別:    {}\n出生:    {}\n中心:    {}\n晶片:    {}\n{}\n",
        candidate.id,
        candidate.name,
        candidate.breed,
        candidate.gender,
        candidate.birthday,
        candidate.location,
        candidate.microchip_no,
        candidate.url
    )
}

/// Sends a simple text message via Telegram.
pub async fn send_text(notifier: &TelegramNotifier, chat_id: &str, text: &str) -> Result<(), NotifyError> {
    let params = [("chat_id", chat_id.to_string()), ("text", text.to_string())];
    post_form(notifier, "sendMessage", &params).await
}

/// Sends the candidate's photo with its caption.
pub async fn send_photo(notifier: &TelegramNotifier, chat_id: &str, candidate: &Candidate) -> Result<(), NotifyError> {
    let params = [
        ("chat_id", chat_id.to_string()),
        ("caption", caption(candidate)),
        ("photo", candidate.photo_url.clone()),
    ];
    info!("📤 Sending candidate no. {} to {}", candidate.id, chat_id);
    post_form(notifier, "sendPhoto", &params).await
}

async fn post_form(
    notifier: &TelegramNotifier,
    method: &str,
    params: &[(&str, String)],
) -> Result<(), NotifyError> {
    let response = match timeout(
        Duration::from_secs(10),
        notifier.client.post(notifier.api_url(method)).form(params).send(),
    )
    .await
    {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Telegram {} failed: {:?}", method, e);
            return Err(NotifyError::Api(format!("Send failed: {}", e)));
        }
        Err(_) => {
            warn!("⏳ Telegram {} timed out", method);
            return Err(NotifyError::Unreachable);
        }
    };
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::Status(status.as_u16(), body));
    }
    info!("✅ Telegram {} [{}]", method, status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample;
    use crate::model::Species;

    #[test]
    fn caption_lists_fields_then_url() {
        let candidate = Candidate {
            id: "190123".into(),
            name: "Mimi".into(),
            breed: "唐貓".into(),
            gender: "母".into(),
            birthday: "2023-05-01".into(),
            location: "觀塘".into(),
            microchip_no: "900164".into(),
            url: "https://shelter.example/a/190123".into(),
            ..sample(Species::Cat)
        };

        let text = caption(&candidate);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "編號:    190123");
        assert_eq!(lines[2], "品種:    唐貓");
        assert_eq!(lines[5], "中心:    觀塘");
        assert_eq!(lines[6], "晶片:    900164");
        assert_eq!(lines[7], "https://shelter.example/a/190123");
    }
}
