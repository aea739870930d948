// Personalization — one template, one recipient, one block list.
//
// Two passes, both order-preserving:
//   1. resolve per-recipient links, dropping preset buttons whose token is missing
//   2. substitute {name} in text blocks
//
// Pure: depends only on the template, the recipient and the link base.

use crate::db::models::Recipient;

use super::blocks::{LinkPreset, MessageBlock};

/// Placeholder replaced with the recipient's first name in text blocks.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Used in place of the first name when the registry has none.
pub const NAME_FALLBACK: &str = "there";

/// Builds claim and referral deep links under a fixed base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base: String,
}

impl LinkBuilder {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn claim(&self, claim_id: &str) -> String {
        format!("{}/claim/{}", self.base, claim_id)
    }

    pub fn referral(&self, referral_id: &str) -> String {
        format!("{}/referral?ref={}", self.base, referral_id)
    }
}

/// Produce the recipient-specific block list for a template.
pub fn personalize(
    template: &[MessageBlock],
    recipient: &Recipient,
    links: &LinkBuilder,
) -> Vec<MessageBlock> {
    template
        .iter()
        .filter_map(|block| resolve_link(block, recipient, links))
        .map(|block| substitute_name(block, recipient))
        .collect()
}

/// First pass: returns None when the block must be dropped for this recipient.
fn resolve_link(
    block: &MessageBlock,
    recipient: &Recipient,
    links: &LinkBuilder,
) -> Option<MessageBlock> {
    match block {
        MessageBlock::Button {
            id,
            content,
            preset: Some(preset),
            ..
        } => {
            let link = match preset {
                LinkPreset::Claim => links.claim(recipient.claim_id.as_deref()?),
                LinkPreset::Referral => links.referral(recipient.referral_id.as_deref()?),
            };
            Some(MessageBlock::Button {
                id: *id,
                content: content.clone(),
                link: Some(link),
                preset: Some(*preset),
            })
        }
        // Link blocks always point at the referral page. Without a
        // referral_id the reference is left empty rather than dropped.
        MessageBlock::Link { id, content, .. } => Some(MessageBlock::Link {
            id: *id,
            content: content.clone(),
            link: Some(links.referral(recipient.referral_id.as_deref().unwrap_or_default())),
        }),
        other => Some(other.clone()),
    }
}

/// Second pass: fill in {name} on text blocks, leave everything else alone.
fn substitute_name(block: MessageBlock, recipient: &Recipient) -> MessageBlock {
    match block {
        MessageBlock::Text { id, content } => {
            let name = recipient
                .first_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(NAME_FALLBACK);
            MessageBlock::Text {
                id,
                content: content.replace(NAME_PLACEHOLDER, name),
            }
        }
        other => other,
    }
}
