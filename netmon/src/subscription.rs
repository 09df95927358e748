use std::time::Duration;

use iced::Subscription;

use crate::message::Message;

/// How often transient canvas feedback is checked for expiry.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Periodic tick that expires connection feedback.
pub fn tick_subscription() -> Subscription<Message> {
    iced::time::every(TICK_INTERVAL).map(|_| Message::Tick)
}
