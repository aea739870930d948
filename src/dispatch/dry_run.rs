// Dry-run provider — logs what would be sent and sends nothing.
//
// Used by `megaphone send --dry-run` and by tests that need a provider
// without network access.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::DeliveryProvider;
use crate::broadcast::OutboundMessage;

pub struct DryRunProvider;

#[async_trait]
impl DeliveryProvider for DryRunProvider {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn send_batch(&self, messages: &[OutboundMessage]) -> Result<serde_json::Value> {
        let data: Vec<serde_json::Value> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                info!(
                    to = %message.to,
                    subject = %message.subject,
                    blocks = message.body.blocks.len(),
                    "Dry run: would send"
                );
                serde_json::json!({ "id": format!("dry-run-{i}") })
            })
            .collect();

        Ok(serde_json::json!({ "data": data }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::compose::MessageBody;

    #[tokio::test]
    async fn test_acknowledges_every_message() {
        let message = OutboundMessage {
            from: "STUFF <hello@getstuff.city>".to_string(),
            to: "a@x.io".to_string(),
            subject: "s".to_string(),
            body: MessageBody {
                preview_text: "s".to_string(),
                image_url: None,
                blocks: vec![],
            },
        };
        let ack = DryRunProvider
            .send_batch(&[message.clone(), message])
            .await
            .unwrap();
        assert_eq!(
            ack,
            serde_json::json!({"data": [{"id": "dry-run-0"}, {"id": "dry-run-1"}]})
        );
    }
}
