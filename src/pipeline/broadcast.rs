// Broadcast pipeline: resolve → compose → dispatch.
//
// Strategy: resolve the segment (skipped entirely in test mode), stop early
// if nobody matches, personalize one message per recipient, then hand the
// whole batch to the provider in one call. The pipeline itself never
// writes anything, so any failure leaves no partial state behind.

use tracing::{info, warn};

use crate::broadcast::{compose, BroadcastRequest, ComposeSettings};
use crate::db::Database;
use crate::dispatch::{self, DeliveryProvider, DispatchResult};
use crate::error::BroadcastError;
use crate::segment::resolver;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastOutcome {
    /// The segment was empty; nothing was composed or sent.
    NoRecipients,
    /// The batch was accepted by the provider.
    Sent(DispatchResult),
}

impl BroadcastOutcome {
    /// Human-readable summary, also used as the API response message.
    pub fn message(&self) -> String {
        match self {
            BroadcastOutcome::NoRecipients => "No users found.".to_string(),
            BroadcastOutcome::Sent(result) => {
                format!("Successfully sent emails to {} users.", result.total_sent)
            }
        }
    }
}

/// Run one broadcast end to end.
pub async fn run(
    db: &dyn Database,
    provider: &dyn DeliveryProvider,
    settings: &ComposeSettings,
    request: &BroadcastRequest,
) -> Result<BroadcastOutcome, BroadcastError> {
    let recipients = if request.test_mode {
        info!("Test mode: skipping segment resolution");
        Vec::new()
    } else {
        let recipients =
            resolver::resolve(db, request.segment_filter, request.time_filter)
                .await
                .map_err(|e| {
                    warn!(segment = %request.segment_filter, error = %e, "Segment resolution failed");
                    BroadcastError::SegmentQueryFailed(e)
                })?;

        if recipients.is_empty() {
            info!(segment = %request.segment_filter, "No recipients matched");
            return Ok(BroadcastOutcome::NoRecipients);
        }
        recipients
    };

    let messages = compose(request, &recipients, settings);
    info!(
        messages = messages.len(),
        blocks = request.components.len(),
        "Broadcast composed"
    );

    let result = dispatch::send(provider, &messages).await?;
    info!(total_sent = result.total_sent, "Broadcast sent");
    Ok(BroadcastOutcome::Sent(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages() {
        assert_eq!(BroadcastOutcome::NoRecipients.message(), "No users found.");
        let sent = BroadcastOutcome::Sent(DispatchResult {
            total_sent: 2,
            batch_data: serde_json::Value::Null,
        });
        assert_eq!(sent.message(), "Successfully sent emails to 2 users.");
    }
}
