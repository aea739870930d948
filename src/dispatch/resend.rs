// Resend batch email API client.
//
// POST {api_url}/emails/batch with a JSON array of up to one message per
// recipient. Resend answers with `{"data": [{"id": ...}, ...]}` on success
// and `{"statusCode", "name", "message"}` on failure.
//
// API docs: https://resend.com/docs/api-reference/emails/send-batch-emails

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::render;
use super::DeliveryProvider;
use crate::broadcast::OutboundMessage;

/// Default Resend API root.
pub const DEFAULT_API_URL: &str = "https://api.resend.com";

/// Delivery provider backed by Resend's batch endpoint.
pub struct ResendProvider {
    client: Client,
    api_key: String,
    api_url: String,
}

impl ResendProvider {
    /// Create a client for the given API root (normally [`DEFAULT_API_URL`]).
    pub fn new(api_key: &str, api_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("megaphone/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DeliveryProvider for ResendProvider {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send_batch(&self, messages: &[OutboundMessage]) -> Result<serde_json::Value> {
        let url = format!("{}/emails/batch", self.api_url);
        let payload: Vec<ResendEmail<'_>> = messages.iter().map(ResendEmail::from).collect();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Resend API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ResendError>(&body) {
                Ok(err) => anyhow::bail!("{} ({})", err.message, status),
                Err(_) => anyhow::bail!("Resend API returned {}: {}", status, body),
            }
        }

        let ack: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Resend response")?;

        debug!(
            messages = messages.len(),
            acknowledged = ack["data"].as_array().map(Vec::len),
            "Resend accepted batch"
        );
        Ok(ack)
    }
}

// --- Resend API request/response types ---

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
    text: String,
}

impl<'a> From<&'a OutboundMessage> for ResendEmail<'a> {
    fn from(message: &'a OutboundMessage) -> Self {
        Self {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: render::to_html(&message.body),
            text: render::to_text(&message.body),
        }
    }
}

#[derive(Deserialize)]
struct ResendError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::compose::MessageBody;
    use crate::broadcast::MessageBlock;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(to: &str) -> OutboundMessage {
        OutboundMessage {
            from: "STUFF <hello@getstuff.city>".to_string(),
            to: to.to_string(),
            subject: "Doors open".to_string(),
            body: MessageBody {
                preview_text: "Doors open".to_string(),
                image_url: None,
                blocks: vec![MessageBlock::Text {
                    id: 1,
                    content: "Hi there".to_string(),
                }],
            },
        }
    }

    #[tokio::test]
    async fn test_batch_posts_all_messages_once() {
        let server = MockServer::start().await;
        let ack = serde_json::json!({"data": [{"id": "e1"}, {"id": "e2"}]});

        Mock::given(method("POST"))
            .and(path("/emails/batch"))
            .and(header("authorization", "Bearer re_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&ack))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ResendProvider::new("re_test", &server.uri()).unwrap();
        let result = provider
            .send_batch(&[message("a@x.io"), message("b@x.io")])
            .await
            .unwrap();
        assert_eq!(result, ack);

        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let sent = sent.as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["from"], "STUFF <hello@getstuff.city>");
        assert_eq!(sent[0]["to"], serde_json::json!(["a@x.io"]));
        assert_eq!(sent[1]["to"], serde_json::json!(["b@x.io"]));
        assert_eq!(sent[0]["subject"], "Doors open");
        assert_eq!(sent[0]["text"], "Hi there");
        assert!(sent[0]["html"].as_str().unwrap().contains("<p>Hi there</p>"));
    }

    #[tokio::test]
    async fn test_error_message_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails/batch"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "statusCode": 422,
                "name": "validation_error",
                "message": "The gmail.com domain is not verified."
            })))
            .mount(&server)
            .await;

        let provider = ResendProvider::new("re_test", &server.uri()).unwrap();
        let err = provider.send_batch(&[message("a@x.io")]).await.unwrap_err();
        assert!(err.to_string().contains("domain is not verified"));
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let provider = ResendProvider::new("re_test", &format!("{}/", server.uri())).unwrap();
        let err = provider.send_batch(&[message("a@x.io")]).await.unwrap_err();
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }
}
