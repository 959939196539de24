//! Fire-and-forget front-end cache invalidation.

use serde::Serialize;

use portfolio_core::config::RevalidateConfig;

/// Payload POSTed to `{frontend_url}/api/revalidate`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RevalidatePayload {
    pub secret: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Revalidator {
    client: reqwest::Client,
    config: RevalidateConfig,
}

impl Revalidator {
    pub fn new(client: reqwest::Client, config: RevalidateConfig) -> Self {
        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/revalidate",
            self.config.frontend_url.trim_end_matches('/')
        )
    }

    pub fn payload(&self, kind: &str, slug: Option<&str>) -> RevalidatePayload {
        RevalidatePayload {
            secret: self.config.secret.clone(),
            kind: kind.to_string(),
            slug: slug.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Ask the front-end to drop cached pages for `kind` (and `slug`).
    ///
    /// Returns immediately; the request runs on its own task and failures
    /// are only logged. Does nothing when not configured.
    pub fn trigger(&self, kind: &str, slug: Option<&str>) {
        if !self.is_enabled() {
            return;
        }
        let client = self.client.clone();
        let url = self.endpoint();
        let payload = self.payload(kind, slug);
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) => {
                    tracing::info!(kind = %payload.kind, status = %resp.status(), "Revalidate sent")
                }
                Err(e) => tracing::warn!(kind = %payload.kind, error = %e, "Revalidate failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revalidator(url: &str, secret: &str) -> Revalidator {
        Revalidator::new(
            reqwest::Client::new(),
            RevalidateConfig {
                frontend_url: url.to_string(),
                secret: secret.to_string(),
            },
        )
    }

    #[test]
    fn test_payload_omits_empty_slug() {
        let r = revalidator("https://site.example", "s");
        let json = serde_json::to_value(r.payload("profile", None)).unwrap();
        assert_eq!(json, serde_json::json!({"secret": "s", "type": "profile"}));

        let json = serde_json::to_value(r.payload("project", Some("my-app"))).unwrap();
        assert_eq!(json["slug"], "my-app");

        assert_eq!(r.payload("project", Some("")).slug, None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let r = revalidator("https://site.example/", "s");
        assert_eq!(r.endpoint(), "https://site.example/api/revalidate");
    }

    #[tokio::test]
    async fn test_disabled_trigger_is_noop() {
        let r = revalidator("", "");
        assert!(!r.is_enabled());
        r.trigger("settings", None);
    }
}
