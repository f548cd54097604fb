pub mod dispatcher;
pub mod telegram;

pub use dispatcher::{notify_candidates, ErrorPolicy, NotificationSink};
pub use telegram::TelegramNotifier;
