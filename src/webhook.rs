//! Webhook delivery for matching bulletins.
//!
//! One POST with a JSON body per forwarded bulletin. Deliveries are not
//! retried; a failed POST is logged by the caller and the bulletin is gone.
//! The payload shape is Discord-compatible but any endpoint accepting the
//! same JSON works.

use chrono::SecondsFormat;
use serde::Serialize;
use tracing::debug;

use crate::bulletin::Bulletin;

/// HTTP connect timeout for the reqwest client.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for a single delivery.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Accent color of the embed.
const EMBED_COLOR: u32 = 13_035_253;

/// Footer text naming the feed the bulletin came from.
const FEED_FOOTER: &str = "nwws@nwws-oi.weather.gov/nwws";

/// Errors from webhook delivery.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The POST could not be sent.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("webhook rejected delivery ({status}): {body}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: reqwest::StatusCode,
        /// Response body, as far as it could be read.
        body: String,
    },
}

/// JSON body POSTed to the webhook.
#[derive(Debug, Serialize)]
pub struct Payload {
    /// Plain-text line above the embed.
    pub content: String,
    /// Rich embeds; always exactly one.
    pub embeds: Vec<Embed>,
}

/// A single rich embed carrying the bulletin.
#[derive(Debug, Serialize)]
pub struct Embed {
    /// Product summary line.
    pub title: String,
    /// Full product text, fenced as a code block.
    pub description: String,
    /// Accent color.
    pub color: u32,
    /// Receipt time, ISO 8601.
    pub timestamp: String,
    /// Product identification fields.
    pub fields: Vec<EmbedField>,
    /// Feed attribution.
    pub footer: EmbedFooter,
}

/// A name/value pair rendered inside the embed.
#[derive(Debug, Serialize)]
pub struct EmbedField {
    /// Field label.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Render next to the preceding field.
    pub inline: bool,
}

/// Embed footer line.
#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
}

impl Payload {
    /// Build the webhook body for one bulletin.
    pub fn for_bulletin(bulletin: &Bulletin) -> Self {
        let code = |value: &str| format!("`{value}`");
        let field = |name: &str, value: String| EmbedField {
            name: name.to_owned(),
            value,
            inline: true,
        };

        Self {
            content: "**New message from NWWS-OI**".to_owned(),
            embeds: vec![Embed {
                title: bulletin.title.clone(),
                description: format!("```\n{}\n```", bulletin.text),
                color: EMBED_COLOR,
                timestamp: bulletin
                    .received_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                fields: vec![
                    field(
                        "Issued on",
                        code(&bulletin.received_at.format("%m-%d-%Y_%H:%M:%S").to_string()),
                    ),
                    field("TTAAII", code(&bulletin.ttaaii)),
                    field("CCCC", code(&bulletin.cccc)),
                    field("AWIPSID", code(&bulletin.awipsid)),
                    field("ID", code(&bulletin.id)),
                ],
                footer: EmbedFooter {
                    text: FEED_FOOTER.to_owned(),
                },
            }],
        }
    }
}

/// Client for the configured webhook endpoint.
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    /// Create a client POSTing to the given URL.
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self { client, url }
    }

    /// Deliver one bulletin to the webhook.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] if the POST fails or the endpoint answers
    /// with a non-success status. The caller logs and moves on; there is no
    /// retry.
    pub async fn deliver(&self, bulletin: &Bulletin) -> Result<(), WebhookError> {
        let payload = Payload::for_bulletin(bulletin);
        let resp = self.client.post(&self.url).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected { status, body });
        }
        debug!(cccc = %bulletin.cccc, id = %bulletin.id, "bulletin delivered to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn bulletin() -> Bulletin {
        Bulletin {
            cccc: "koun".to_owned(),
            ttaaii: "wfus54".to_owned(),
            awipsid: "toroun".to_owned(),
            id: "14894.1834".to_owned(),
            title: "KOUN issues Tornado Warning".to_owned(),
            text: "TORNADO WARNING".to_owned(),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn payload_carries_bulletin_fields() {
        let payload = Payload::for_bulletin(&bulletin());
        assert_eq!(payload.embeds.len(), 1);
        let embed = &payload.embeds[0];
        assert_eq!(embed.title, "KOUN issues Tornado Warning");
        assert!(embed.description.contains("TORNADO WARNING"));
        let values: Vec<&str> = embed.fields.iter().map(|f| f.value.as_str()).collect();
        assert!(values.contains(&"`wfus54`"));
        assert!(values.contains(&"`koun`"));
        assert!(values.contains(&"`toroun`"));
        assert!(values.contains(&"`14894.1834`"));
    }

    #[test]
    fn payload_serializes_to_expected_shape() {
        let json_result = serde_json::to_value(Payload::for_bulletin(&bulletin()));
        let json = match json_result {
            Ok(json) => json,
            Err(err) => panic!("payload should serialize: {err}"),
        };
        assert_eq!(json["content"], "**New message from NWWS-OI**");
        assert_eq!(json["embeds"][0]["color"], EMBED_COLOR);
        assert_eq!(json["embeds"][0]["footer"]["text"], FEED_FOOTER);
        assert_eq!(json["embeds"][0]["fields"][1]["name"], "TTAAII");
    }
}
