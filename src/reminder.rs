//! One-shot reminder scheduling
//!
//! `schedule` returns its confirmation immediately; the reminder itself
//! is an independent task that sleeps, checks that the session is still
//! running, and speaks exactly once through the shared speaker. A
//! reminder whose session stopped first is dropped silently.

use std::time::Duration;

use crate::adapters::Speaker;
use crate::session::Session;

/// Schedules deferred spoken reminders
#[derive(Clone)]
pub struct ReminderScheduler {
    session: Session,
    speaker: Speaker,
}

impl ReminderScheduler {
    /// Create a scheduler speaking through the shared output
    #[must_use]
    pub const fn new(session: Session, speaker: Speaker) -> Self {
        Self { session, speaker }
    }

    /// Schedule a reminder and return the spoken confirmation
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn schedule(&self, message: &str, minutes: u64) -> String {
        self.schedule_after(message, Duration::from_secs(minutes.saturating_mul(60)));
        let unit = if minutes == 1 { "minute" } else { "minutes" };
        format!("Reminder set for {minutes} {unit}: {message}")
    }

    /// Schedule a reminder with an explicit delay
    pub fn schedule_after(&self, message: &str, delay: Duration) {
        let session = self.session.clone();
        let speaker = self.speaker.clone();
        let message = message.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if session.is_running() {
                speaker.say_default(&format!("Reminder: {message}")).await;
                tracing::info!(message = %message, "reminder fired");
            } else {
                tracing::debug!(message = %message, "session stopped, reminder dropped");
            }
        });
    }
}
