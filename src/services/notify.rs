use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

/// Where a confirmed notification goes: an email address or an E.164
/// phone number, depending on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub channel: Channel,
    pub address: String,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = match self.channel {
            Channel::Email => "email",
            Channel::Sms => "sms",
        };
        write!(f, "{}:{}", channel, self.address)
    }
}

pub trait Notifier {
    fn notify(
        &self,
        destination: &Destination,
        message: &str,
    ) -> impl Future<Output = Result<(), WatchError>> + Send;
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    channel: Channel,
    to: &'a str,
    message: &'a str,
}

/// Posts `{channel, to, message}` as JSON to a delivery gateway that fans
/// out to email or SMS.
#[derive(Clone)]
pub struct GatewayNotifier {
    client: Client,
    url: String,
}

impl GatewayNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for GatewayNotifier {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), WatchError> {
        let failed = |details: String| WatchError::NotifyFailed {
            destination: destination.to_string(),
            details,
        };

        let body = GatewayRequest {
            channel: destination.channel,
            to: &destination.address,
            message,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("gateway returned {}", response.status())));
        }
        info!(destination = %destination, "notification delivered");
        Ok(())
    }
}

/// Dry-run notifier: logs the message instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), WatchError> {
        info!(destination = %destination, text = %message, "notify (log only)");
        Ok(())
    }
}

/// Either concrete notifier, chosen at startup from configuration.
#[derive(Clone)]
pub enum AnyNotifier {
    Gateway(GatewayNotifier),
    Log(LogNotifier),
}

impl Notifier for AnyNotifier {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), WatchError> {
        match self {
            AnyNotifier::Gateway(n) => n.notify(destination, message).await,
            AnyNotifier::Log(n) => n.notify(destination, message).await,
        }
    }
}
