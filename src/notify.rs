//! Desktop notifications for brightness changes.
//!
//! Notifications go to the freedesktop notification service on the session
//! bus through zbus's blocking API. They are best effort: callers log
//! failures and carry on.

use anyhow::{Context, Result};
use std::collections::HashMap;
use zbus::blocking::Connection;
use zbus::zvariant::Value;

use crate::constants::{NOTIFICATION_APP_NAME, NOTIFICATION_SUMMARY};
use crate::logger::Log;

/// D-Bus proxy for the org.freedesktop.Notifications interface.
#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: &HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Something that can show a short message to the user.
pub trait Notifier {
    fn notify(&self, message: &str) -> Result<()>;
}

// freedesktop urgency levels: 0 low, 1 normal, 2 critical
const URGENCY_NORMAL: u8 = 1;
// Let the server pick the display duration
const DEFAULT_EXPIRE_TIMEOUT: i32 = -1;

/// [`Notifier`] that posts desktop notifications over D-Bus.
pub struct DesktopNotifier {
    proxy: NotificationsProxyBlocking<'static>,
}

impl DesktopNotifier {
    /// Connect to the session bus.
    pub fn connect() -> Result<Self> {
        let connection = Connection::session().context("Failed to connect to the session bus")?;
        let proxy = NotificationsProxyBlocking::new(&connection)
            .context("Failed to create notification proxy")?;
        Ok(Self { proxy })
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        let urgency = Value::from(URGENCY_NORMAL);
        let mut hints = HashMap::new();
        hints.insert("urgency", &urgency);

        self.proxy
            .notify(
                NOTIFICATION_APP_NAME,
                0,
                "",
                NOTIFICATION_SUMMARY,
                message,
                &[],
                &hints,
                DEFAULT_EXPIRE_TIMEOUT,
            )
            .context("Failed to send desktop notification")?;
        Ok(())
    }
}

/// [`Notifier`] used when no notification service is reachable.
///
/// Messages are only written to the debug log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        Log::log_debug(&format!("Notification: {}", message));
        Ok(())
    }
}

/// Pick the desktop notifier if the session bus is reachable.
pub fn default_notifier() -> Box<dyn Notifier> {
    match DesktopNotifier::connect() {
        Ok(notifier) => Box::new(notifier),
        Err(e) => {
            Log::log_warning(&format!(
                "Desktop notifications unavailable ({:#}), continuing without them",
                e
            ));
            Box::new(LogNotifier)
        }
    }
}

/// Format the notification text for a brightness change.
pub fn brightness_message(display_id: &str, brightness: i32) -> String {
    format!("Display {}: {}%", display_id, brightness)
}
