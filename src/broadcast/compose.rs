// Broadcast composition — one personalized outbound message per recipient.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::db::models::Recipient;

use super::blocks::MessageBlock;
use super::personalize::{personalize, LinkBuilder};
use super::BroadcastRequest;

/// Process-wide settings the composer reads from config.
#[derive(Debug, Clone)]
pub struct ComposeSettings {
    /// `From:` header, e.g. `STUFF <hello@getstuff.city>`
    pub sender: String,
    pub links: LinkBuilder,
}

/// Body content handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub preview_text: String,
    pub image_url: Option<String>,
    pub blocks: Vec<MessageBlock>,
}

/// A fully resolved message, ready for the delivery provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: MessageBody,
}

/// A fixed development inbox used instead of the real segment in test mode.
#[derive(Debug, Clone, Copy)]
pub struct TestRecipient {
    pub email: &'static str,
    pub first_name: &'static str,
    pub claim_id: &'static str,
    pub referral_id: &'static str,
}

/// Test-mode audience. Sending with `sendTestUser` goes only to these two.
pub const TEST_RECIPIENTS: [TestRecipient; 2] = [
    TestRecipient {
        email: "naama@getstuff.city",
        first_name: "Naama",
        claim_id: "40646a63-88e0-417b-8f78-d5267c3d129f",
        referral_id: "2c831572-6db3-4a92-a702-25ed07211002",
    },
    TestRecipient {
        email: "eunice@getstuff.city",
        first_name: "Eunice",
        claim_id: "9cf0cf18-6738-48d7-b842-4ac08ffe6a0b",
        referral_id: "04fe3ffe-89ee-43fc-b87a-37d087b37239",
    },
];

impl TestRecipient {
    pub fn to_recipient(&self) -> Recipient {
        Recipient {
            email: self.email.to_string(),
            first_name: Some(self.first_name.to_string()),
            claim_id: Some(self.claim_id.to_string()),
            referral_id: Some(self.referral_id.to_string()),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            referred_by: None,
        }
    }
}

/// The test-mode audience as registry recipients.
pub fn test_recipients() -> Vec<Recipient> {
    TEST_RECIPIENTS.iter().map(TestRecipient::to_recipient).collect()
}

/// Build one outbound message per recipient, in recipient order.
///
/// In test mode `recipients` is ignored and the built-in test list is used.
pub fn compose(
    request: &BroadcastRequest,
    recipients: &[Recipient],
    settings: &ComposeSettings,
) -> Vec<OutboundMessage> {
    let test_list;
    let audience = if request.test_mode {
        test_list = test_recipients();
        debug!(ignored = recipients.len(), "Test mode: using built-in recipients");
        test_list.as_slice()
    } else {
        recipients
    };

    audience
        .iter()
        .map(|recipient| {
            if recipient.referral_id.is_none() {
                debug!(email = %recipient.email, "Recipient has no referral id");
            }
            OutboundMessage {
                from: settings.sender.clone(),
                to: recipient.email.clone(),
                subject: request.subject.clone(),
                body: MessageBody {
                    preview_text: request.subject.clone(),
                    image_url: request.image_url.clone(),
                    blocks: personalize(&request.components, recipient, &settings.links),
                },
            }
        })
        .collect()
}
