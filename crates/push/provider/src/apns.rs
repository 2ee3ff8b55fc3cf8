//! APNs provider using the a2 crate.

use a2::NotificationBuilder as _;
use color_eyre::eyre::WrapErr as _;
use push_core::{DeliveryTask, Message, Priority, ProviderError, ProviderErrorKind};

use crate::Provider;

/// APNs provider using certificate authentication.
pub struct ApnsProvider {
    client: a2::Client,
    /// Topic used when a request carries none.
    topic: Option<String>,
}

impl ApnsProvider {
    /// Create a production APNs provider from PKCS12 certificate bytes and password.
    pub fn new(pkcs12_der: &[u8], password: &str) -> color_eyre::eyre::Result<Self> {
        Self::with_endpoint(pkcs12_der, password, a2::Endpoint::Production)
    }

    /// Create an APNs provider for the sandbox environment.
    pub fn sandbox(pkcs12_der: &[u8], password: &str) -> color_eyre::eyre::Result<Self> {
        Self::with_endpoint(pkcs12_der, password, a2::Endpoint::Sandbox)
    }

    /// Load the certificate from disk.
    pub fn from_file(
        path: &std::path::Path,
        password: &str,
        sandbox: bool,
    ) -> color_eyre::eyre::Result<Self> {
        let der = std::fs::read(path)
            .wrap_err_with(|| format!("failed to read APNs certificate {}", path.display()))?;

        if sandbox {
            Self::sandbox(&der, password)
        } else {
            Self::new(&der, password)
        }
    }

    fn with_endpoint(
        pkcs12_der: &[u8],
        password: &str,
        endpoint: a2::Endpoint,
    ) -> color_eyre::eyre::Result<Self> {
        let mut cursor = std::io::Cursor::new(pkcs12_der);
        let config = a2::ClientConfig::new(endpoint);

        let client = a2::Client::certificate(&mut cursor, password, config)
            .wrap_err("failed to create APNs client")?;

        Ok(Self {
            client,
            topic: None,
        })
    }

    /// Set the default topic (app bundle ID).
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

impl Provider for ApnsProvider {
    /// Sends to every token of the batch in order.
    ///
    /// A transient failure on any token fails the whole batch as transient so
    /// the scheduler retries it; otherwise the first permanent failure wins.
    async fn send(&self, task: &DeliveryTask) -> Result<(), ProviderError> {
        let mut permanent = None;

        for token in task.tokens() {
            if let Err(e) = self.send_single(token, task.message()).await {
                tracing::debug!(task = task.index(), error = %e, "APNs delivery failed");

                if e.kind.is_transient() {
                    return Err(e);
                }
                permanent.get_or_insert(e);
            }
        }

        match permanent {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApnsProvider {
    async fn send_single(&self, token: &str, message: &Message) -> Result<(), ProviderError> {
        let overrides = &message.overrides;

        let mut builder = a2::DefaultNotificationBuilder::new()
            .set_title(&message.payload.title)
            .set_body(&message.payload.body);
        if let Some(sound) = overrides.sound.as_deref() {
            builder = builder.set_sound(sound);
        }
        if let Some(badge) = overrides.badge {
            builder = builder.set_badge(badge);
        }

        let options = a2::NotificationOptions {
            apns_topic: overrides.topic.as_deref().or(self.topic.as_deref()),
            apns_priority: overrides.priority.map(|p| match p {
                Priority::High => a2::Priority::High,
                Priority::Normal => a2::Priority::Normal,
            }),
            apns_expiration: overrides.ttl_secs.map(expiration_from_ttl),
            apns_collapse_id: overrides
                .collapse_id
                .as_deref()
                .and_then(|id| a2::CollapseId::new(id).ok()),
            ..Default::default()
        };

        let mut payload = builder.build(token, options);
        for (key, value) in &message.payload.data {
            payload.add_custom_data(key, value).map_err(|e| {
                ProviderError::new(
                    ProviderErrorKind::Rejected,
                    format!("custom data {key:?}: {e}"),
                )
            })?;
        }

        match self.client.send(payload).await {
            Ok(_) => Ok(()),
            Err(a2::Error::ResponseError(response)) => {
                let reason = response.error.as_ref().map(|body| format!("{:?}", body.reason));
                let kind = classify_status(response.code, reason.as_deref());
                Err(ProviderError::new(
                    kind,
                    format!(
                        "APNs responded {}: {}",
                        response.code,
                        reason.as_deref().unwrap_or("no reason")
                    ),
                ))
            }
            Err(e) => Err(ProviderError::new(ProviderErrorKind::Network, e.to_string())),
        }
    }
}

/// Classify an APNs HTTP status and reason.
pub fn classify_status(code: u16, reason: Option<&str>) -> ProviderErrorKind {
    match (code, reason) {
        (410, _) => ProviderErrorKind::Unregistered,
        (_, Some("Unregistered")) => ProviderErrorKind::Unregistered,
        (_, Some("BadDeviceToken" | "DeviceTokenNotForTopic")) => ProviderErrorKind::InvalidToken,
        (429, _) => ProviderErrorKind::RateLimited,
        (500..=599, _) => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::Rejected,
    }
}

fn expiration_from_ttl(ttl_secs: u64) -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    now.saturating_add(ttl_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(410, None), ProviderErrorKind::Unregistered);
        assert_eq!(
            classify_status(400, Some("BadDeviceToken")),
            ProviderErrorKind::InvalidToken
        );
        assert_eq!(classify_status(429, None), ProviderErrorKind::RateLimited);
        assert_eq!(
            classify_status(503, Some("ServiceUnavailable")),
            ProviderErrorKind::Unavailable
        );
        assert_eq!(
            classify_status(413, Some("PayloadTooLarge")),
            ProviderErrorKind::Rejected
        );
    }

    #[test]
    fn test_classified_transience() {
        assert!(classify_status(500, None).is_transient());
        assert!(classify_status(429, None).is_transient());
        assert!(!classify_status(403, None).is_transient());
        assert!(!classify_status(410, None).is_transient());
    }

    #[test]
    fn test_expiration_is_in_future() {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(expiration_from_ttl(60) >= now + 60);
    }
}
