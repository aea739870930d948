// Dispatch — hands a composed batch to the delivery provider.
//
// One provider call per broadcast, never one per recipient: the provider
// either accepts the whole batch or the whole send is reported as failed.
// No retries and no per-message accounting happen here.

pub mod dry_run;
pub mod render;
pub mod resend;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use crate::broadcast::OutboundMessage;
use crate::error::BroadcastError;

/// A delivery backend that accepts a batch of messages in one call.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// Short name for logs ("resend", "dry-run").
    fn name(&self) -> &'static str;

    /// Send the batch. Returns the provider's raw acknowledgment payload.
    async fn send_batch(&self, messages: &[OutboundMessage]) -> Result<serde_json::Value>;
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    /// How many recipients the batch targeted
    pub total_sent: usize,
    /// The provider's acknowledgment, passed through untouched
    pub batch_data: serde_json::Value,
}

/// Deliver the batch through `provider` in a single call.
pub async fn send(
    provider: &dyn DeliveryProvider,
    messages: &[OutboundMessage],
) -> Result<DispatchResult, BroadcastError> {
    info!(
        provider = provider.name(),
        messages = messages.len(),
        "Dispatching batch"
    );

    match provider.send_batch(messages).await {
        Ok(batch_data) => Ok(DispatchResult {
            total_sent: messages.len(),
            batch_data,
        }),
        Err(e) => {
            error!(provider = provider.name(), error = %e, "Batch send failed");
            Err(BroadcastError::DispatchFailed(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::compose::MessageBody;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DeliveryProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn send_batch(&self, messages: &[OutboundMessage]) -> Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("rate limited");
            }
            Ok(serde_json::json!({ "data": messages.iter().map(|m| m.to.clone()).collect::<Vec<_>>() }))
        }
    }

    fn message(to: &str) -> OutboundMessage {
        OutboundMessage {
            from: "STUFF <hello@getstuff.city>".to_string(),
            to: to.to_string(),
            subject: "s".to_string(),
            body: MessageBody {
                preview_text: "s".to_string(),
                image_url: None,
                blocks: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_whole_batch_in_one_call() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let batch = vec![message("a@x.io"), message("b@x.io"), message("c@x.io")];
        let result = send(&provider, &batch).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.total_sent, 3);
        assert_eq!(result.batch_data["data"][2], "c@x.io");
    }

    #[tokio::test]
    async fn test_provider_failure_is_dispatch_failed() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let err = send(&provider, &[message("a@x.io")]).await.unwrap_err();
        assert!(matches!(err, BroadcastError::DispatchFailed(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = DispatchResult {
            total_sent: 2,
            batch_data: serde_json::json!({"data": []}),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"totalSent": 2, "batchData": {"data": []}})
        );
    }
}
