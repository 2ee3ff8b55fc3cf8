//! Inbound push request.

/// A single logical notification intent.
///
/// The platform is kept as the raw tag the caller sent; it is validated when
/// the request is normalized into delivery tasks.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PushRequest {
    /// Target platform tag ("ios", "android", "webpush").
    pub platform: String,

    /// Recipient device tokens, opaque to the engine.
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Notification content.
    #[serde(default)]
    pub payload: Payload,

    /// Optional per-platform delivery overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Overrides>,
}

impl PushRequest {
    /// Create a request with an empty payload.
    pub fn new<I, T>(platform: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            platform: platform.into(),
            tokens: tokens.into_iter().map(Into::into).collect(),
            payload: Payload::default(),
            overrides: None,
        }
    }

    /// Set the title and body.
    pub fn with_message(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.payload.title = title.into();
        self.payload.body = body.into();
        self
    }

    /// Add a custom data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.data.insert(key.into(), value.into());
        self
    }

    /// Set the delivery overrides.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

/// Notification content shared by every recipient of a request.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    /// Arbitrary key/value data delivered alongside the alert.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Per-platform delivery overrides.
///
/// Providers read the fields they understand and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Overrides {
    /// APNs topic (bundle ID). Falls back to the provider's configured topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Notifications sharing a collapse ID replace each other on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_id: Option<String>,

    /// How long the provider should keep retrying an offline device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

/// Delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_request() {
        let req: PushRequest =
            serde_json::from_str(r#"{"platform":"ios","tokens":["a","b"]}"#).unwrap();

        assert_eq!(req.platform, "ios");
        assert_eq!(req.tokens, vec!["a", "b"]);
        assert_eq!(req.payload, Payload::default());
        assert!(req.overrides.is_none());
    }

    #[test]
    fn test_deserialize_full_request() {
        let req: PushRequest = serde_json::from_str(
            r#"{
                "platform": "android",
                "tokens": ["t1"],
                "payload": {"title": "Hi", "body": "There", "data": {"k": 1}},
                "overrides": {"sound": "default", "badge": 3, "priority": "high"}
            }"#,
        )
        .unwrap();

        assert_eq!(req.payload.title, "Hi");
        assert_eq!(req.payload.data["k"], 1);
        let overrides = req.overrides.unwrap();
        assert_eq!(overrides.badge, Some(3));
        assert_eq!(overrides.priority, Some(Priority::High));
        assert_eq!(overrides.topic, None);
    }

    #[test]
    fn test_missing_tokens_deserialize_empty() {
        let req: PushRequest = serde_json::from_str(r#"{"platform":"ios"}"#).unwrap();
        assert!(req.tokens.is_empty());
    }

    #[test]
    fn test_builder() {
        let req = PushRequest::new("webpush", ["x"])
            .with_message("title", "body")
            .with_data("url", "https://example.com");

        assert_eq!(req.payload.body, "body");
        assert_eq!(req.payload.data["url"], "https://example.com");
    }
}
