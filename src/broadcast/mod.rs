// Broadcast content — the request, its message blocks, and the per-recipient
// personalization and composition that turn it into outbound messages.

pub mod blocks;
pub mod compose;
pub mod personalize;

use serde::{Deserialize, Deserializer};

use crate::segment::{SegmentFilter, TimeFilter};

pub use blocks::{LinkPreset, MessageBlock};
pub use compose::{compose, ComposeSettings, OutboundMessage};
pub use personalize::{personalize, LinkBuilder};

/// Everything the admin form submits for one broadcast.
///
/// Wire form: `{subject, imageUrl?, components, targetGroup?, timeFilter?, sendTestUser?}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub subject: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub components: Vec<MessageBlock>,
    #[serde(default, rename = "targetGroup", deserialize_with = "target_group")]
    pub segment_filter: SegmentFilter,
    #[serde(default, deserialize_with = "time_filter")]
    pub time_filter: Option<TimeFilter>,
    /// Send only to the built-in test recipients
    #[serde(default, rename = "sendTestUser")]
    pub test_mode: bool,
}

fn target_group<'de, D>(deserializer: D) -> Result<SegmentFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(SegmentFilter::from_target_group(raw.as_deref()))
}

/// The form sends the day count as a string, but API callers tend to send
/// a number. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeFilter {
    Days(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn time_filter<'de, D>(deserializer: D) -> Result<Option<TimeFilter>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawTimeFilter> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimeFilter::Days(days)) => u32::try_from(days).ok().and_then(TimeFilter::from_days),
        Some(RawTimeFilter::Text(text)) => TimeFilter::parse(Some(&text)),
        Some(RawTimeFilter::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_request() {
        let request: BroadcastRequest = serde_json::from_value(json!({
            "subject": "Hi",
            "imageUrl": "https://cdn.example/a.png",
            "components": [{"id": 1, "type": "link"}],
            "targetGroup": "not_referred_anyone",
            "timeFilter": "14",
            "sendTestUser": true
        }))
        .unwrap();

        assert_eq!(request.subject, "Hi");
        assert_eq!(request.image_url.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(request.components.len(), 1);
        assert_eq!(request.segment_filter, SegmentFilter::NotReferredAnyone);
        assert_eq!(request.time_filter, Some(TimeFilter { days: 14 }));
        assert!(request.test_mode);
    }

    #[test]
    fn test_minimal_request_defaults() {
        let request: BroadcastRequest =
            serde_json::from_value(json!({"subject": "Hi", "components": []})).unwrap();
        assert_eq!(request.segment_filter, SegmentFilter::All);
        assert_eq!(request.time_filter, None);
        assert!(!request.test_mode);
        assert!(request.image_url.is_none());
    }

    #[test]
    fn test_time_filter_variants() {
        let parse = |value: serde_json::Value| -> Option<TimeFilter> {
            serde_json::from_value::<BroadcastRequest>(json!({"subject": "s", "timeFilter": value}))
                .unwrap()
                .time_filter
        };
        assert_eq!(parse(json!(30)), Some(TimeFilter { days: 30 }));
        assert_eq!(parse(json!("7")), Some(TimeFilter { days: 7 }));
        assert_eq!(parse(json!("any")), None);
        assert_eq!(parse(json!("soon")), None);
        assert_eq!(parse(json!(-2)), None);
        assert_eq!(parse(json!(1.5)), None);
        assert_eq!(parse(json!(null)), None);
    }

    #[test]
    fn test_zero_days_means_no_filter() {
        for value in [json!(0), json!("0")] {
            let request: BroadcastRequest =
                serde_json::from_value(json!({"subject": "s", "timeFilter": value})).unwrap();
            assert_eq!(request.time_filter, None);
        }
    }

    #[test]
    fn test_null_target_group_is_all() {
        let request: BroadcastRequest =
            serde_json::from_value(json!({"subject": "s", "targetGroup": null})).unwrap();
        assert_eq!(request.segment_filter, SegmentFilter::All);
    }

    #[test]
    fn test_missing_subject_is_rejected() {
        assert!(serde_json::from_value::<BroadcastRequest>(json!({"components": []})).is_err());
    }
}
