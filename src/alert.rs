use std::io::Write;
use std::time::Duration;

use log::{error, warn};
use reqwest::Client;
use serde::Serialize;
use tokio::process::Command;
use tokio::time::sleep;
use url::Url;

use crate::error::Error;
use crate::tracker::{AlertEvent, AlertKind};

const BEEP_COUNT: u32 = 10;
const BEEP_SPACING: Duration = Duration::from_millis(50);

/// Desktop-notification target whose session was resolved at startup.
#[derive(Debug)]
struct ResolvedUser {
    name: String,
    uid: u32,
}

/// Delivers notifications to a desktop session and, when configured, to a
/// webhook. Post-construction, delivery is best-effort: failures are logged
/// and never crash the monitor loop.
pub struct Notifier {
    user: Option<ResolvedUser>,
    webhook_url: Option<Url>,
    client: Client,
}

impl Notifier {
    /// Resolving the recipient's uid happens here, once; an unknown user is a
    /// construction-time fatal error rather than a per-alert surprise.
    pub async fn new(
        notify_user: Option<&str>,
        webhook_url: Option<Url>,
    ) -> Result<Notifier, Error> {
        let user = match notify_user {
            Some(name) => Some(resolve_user(name).await?),
            None => None,
        };
        Ok(Notifier {
            user,
            webhook_url,
            client: Client::new(),
        })
    }

    pub fn has_channel(&self) -> bool {
        self.user.is_some() || self.webhook_url.is_some()
    }

    pub async fn notify(&self, message: &str) {
        if let Some(user) = &self.user {
            if let Err(e) = send_desktop_notification(user, message).await {
                warn!("Failed to send desktop notification: {e}");
            }
        }
        if let Some(url) = &self.webhook_url {
            if let Err(e) = self.send_webhook_notification(url, message).await {
                warn!("Failed to send webhook notification: {e}");
            }
        }
    }

    async fn send_webhook_notification(&self, url: &Url, message: &str) -> Result<(), Error> {
        let payload = WebhookMessage {
            content: message.to_string(),
        };
        self.client
            .post(url.clone())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookMessage {
    content: String,
}

async fn resolve_user(name: &str) -> Result<ResolvedUser, Error> {
    let output = Command::new("id").arg("-u").arg(name).output().await?;
    if !output.status.success() {
        return Err(Error::NotifyUser(name.to_string()));
    }
    let uid = String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .map_err(|_| Error::NotifyUser(name.to_string()))?;
    Ok(ResolvedUser {
        name: name.to_string(),
        uid,
    })
}

/// Shells out to notify-send as the recipient, pointing at their session bus.
/// Slow delivery is accepted backpressure on the polling cadence.
async fn send_desktop_notification(user: &ResolvedUser, message: &str) -> Result<(), Error> {
    let bus = format!("unix:path=/run/user/{}/bus", user.uid);
    let status = Command::new("sudo")
        .args(["-u", &user.name, "notify-send", "-u", "critical", "netwatch"])
        .arg(message)
        .env("DBUS_SESSION_BUS_ADDRESS", bus)
        .status()
        .await?;
    if !status.success() {
        return Err(Error::Io(std::io::Error::other(format!(
            "notify-send exited with {status}"
        ))));
    }
    Ok(())
}

/// Rings the terminal bell in a short burst. Not throttled: it signals
/// immediacy, not a discrete alert.
async fn beep() {
    for _ in 0..BEEP_COUNT {
        print!("\x07");
        let _ = std::io::stdout().flush();
        sleep(BEEP_SPACING).await;
    }
}

/// The three delivery channels the tracker's decisions fan out to.
pub struct AlertSink {
    notifier: Notifier,
}

impl AlertSink {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn dispatch(&self, event: &AlertEvent) {
        match event.kind {
            AlertKind::Beep => beep().await,
            AlertKind::LogError => error!("{}", event.message),
            AlertKind::Notify => self.notifier.notify(&event.message).await,
        }
    }
}
