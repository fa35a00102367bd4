//! Best-effort user notifications. Nothing here ever reports failure to the
//! caller: a missing capability, denied permission or a failing backend turns
//! every call into a no-op.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

/// Reminders fire this many hours before the response deadline.
pub const REMINDER_LEAD_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    MeetingJoined,
    NewParticipant,
    MeetingReminder,
}

impl NotificationKind {
    /// Tag used to coalesce notifications of the same kind.
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationKind::MeetingJoined => "meeting-joined",
            NotificationKind::NewParticipant => "new-participant",
            NotificationKind::MeetingReminder => "meeting-reminder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

/// A platform notification backend.
pub trait Notifier: Send + Sync {
    /// Whether the user allowed notifications.
    fn is_permitted(&self) -> bool {
        true
    }

    fn show(&self, notification: &Notification) -> Result<(), String>;
}

/// Writes notifications to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notification: &Notification) -> Result<(), String> {
        log::info!(
            "[{}] {}: {}",
            notification.kind.tag(),
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Notifications unavailable or denied.
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn is_permitted(&self) -> bool {
        false
    }

    fn show(&self, _notification: &Notification) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledNotifier))
    }

    pub fn show(&self, kind: NotificationKind, title: &str, body: &str) {
        deliver(
            self.notifier.as_ref(),
            &Notification {
                kind,
                title: title.to_string(),
                body: body.to_string(),
            },
        );
    }

    pub fn meeting_joined(&self, meeting_name: &str) {
        self.show(
            NotificationKind::MeetingJoined,
            "Joined meeting",
            &format!("You responded to the schedule for {}.", meeting_name),
        );
    }

    pub fn new_participant(&self, meeting_name: &str, participant_name: &str) {
        self.show(
            NotificationKind::NewParticipant,
            "New participant",
            &format!("{} joined {}.", participant_name, meeting_name),
        );
    }

    /// Schedule a reminder 24 hours before `due`. Fires right away if that
    /// moment has already passed; does nothing if `due` itself has passed or
    /// no tokio runtime is running.
    pub fn schedule_reminder(&self, meeting_name: &str, due: DateTime<Utc>) -> Option<JoinHandle<()>> {
        let delay = reminder_delay(Utc::now(), due)?;
        let runtime = tokio::runtime::Handle::try_current().ok()?;

        let notifier = Arc::clone(&self.notifier);
        let notification = Notification {
            kind: NotificationKind::MeetingReminder,
            title: "Response deadline reminder".to_string(),
            body: format!("The response deadline for {} is approaching.", meeting_name),
        };
        log::debug!("Reminder for {} scheduled in {:?}", meeting_name, delay);

        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(notifier.as_ref(), &notification);
        }))
    }
}

/// How long to wait before reminding about `due`, or `None` if it has passed.
pub fn reminder_delay(now: DateTime<Utc>, due: DateTime<Utc>) -> Option<Duration> {
    if due <= now {
        return None;
    }
    let fire_at = due - chrono::Duration::hours(REMINDER_LEAD_HOURS);
    Some((fire_at - now).to_std().unwrap_or(Duration::ZERO))
}

fn deliver(notifier: &dyn Notifier, notification: &Notification) {
    if !notifier.is_permitted() {
        log::debug!("Notifications not permitted, dropping {}", notification.kind.tag());
        return;
    }
    if let Err(e) = notifier.show(notification) {
        log::debug!("Notification {} failed: {}", notification.kind.tag(), e);
    }
}
