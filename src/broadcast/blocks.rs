// Message blocks — the building units of a broadcast's body.
//
// The admin form sends a flat JSON list of `{id, type, content, link?, preset?}`
// objects. We model it as a tagged enum so each variant carries only the
// fields that mean something for it: only buttons have a preset, and a
// `link` block has none at all (it is always a referral link).

use serde::{Deserialize, Deserializer, Serialize};

/// Which per-recipient link a button should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPreset {
    Claim,
    Referral,
}

/// One block of a broadcast, in template or personalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBlock {
    Text {
        id: i64,
        #[serde(default)]
        content: String,
    },
    Button {
        id: i64,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        #[serde(
            default,
            deserialize_with = "lenient_preset",
            skip_serializing_if = "Option::is_none"
        )]
        preset: Option<LinkPreset>,
    },
    Image {
        id: i64,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    Link {
        id: i64,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
}

impl MessageBlock {
    pub fn id(&self) -> i64 {
        match self {
            MessageBlock::Text { id, .. }
            | MessageBlock::Button { id, .. }
            | MessageBlock::Image { id, .. }
            | MessageBlock::Link { id, .. } => *id,
        }
    }

    /// The wire tag: "text", "button", "image" or "link".
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBlock::Text { .. } => "text",
            MessageBlock::Button { .. } => "button",
            MessageBlock::Image { .. } => "image",
            MessageBlock::Link { .. } => "link",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            MessageBlock::Text { content, .. }
            | MessageBlock::Button { content, .. }
            | MessageBlock::Image { content, .. }
            | MessageBlock::Link { content, .. } => content,
        }
    }

    /// The block's link, if this variant has one and it is set.
    pub fn link(&self) -> Option<&str> {
        match self {
            MessageBlock::Text { .. } => None,
            MessageBlock::Button { link, .. }
            | MessageBlock::Image { link, .. }
            | MessageBlock::Link { link, .. } => link.as_deref(),
        }
    }
}

/// The form sends `""` or omits the field for "no preset". Treat any value
/// we don't recognise the same way instead of rejecting the whole request.
fn lenient_preset<'de, D>(deserializer: D) -> Result<Option<LinkPreset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("claim") => Some(LinkPreset::Claim),
        Some("referral") => Some(LinkPreset::Referral),
        _ => None,
    })
}
