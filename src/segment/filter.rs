// Audience filters — the named target group and the recency cutoff.
//
// Both arrive as loosely typed strings from the admin form, so parsing is
// lenient: anything unrecognized means "no restriction" rather than an error.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A named selection rule over the waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentFilter {
    #[default]
    All,
    ClaimedUsername,
    NotClaimedUsername,
    NotReferredAnyone,
}

impl SegmentFilter {
    /// Map the admin form's `targetGroup` value onto a filter.
    /// Missing or unknown values select everyone.
    pub fn from_target_group(target_group: Option<&str>) -> Self {
        match target_group.map(str::trim) {
            Some("claimed_username") => SegmentFilter::ClaimedUsername,
            Some("not_claimed_username") => SegmentFilter::NotClaimedUsername,
            Some("not_referred_anyone") => SegmentFilter::NotReferredAnyone,
            _ => SegmentFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentFilter::All => "all",
            SegmentFilter::ClaimedUsername => "claimed_username",
            SegmentFilter::NotClaimedUsername => "not_claimed_username",
            SegmentFilter::NotReferredAnyone => "not_referred_anyone",
        }
    }
}

impl std::fmt::Display for SegmentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Restricts a segment to people who signed up at least `days` days ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFilter {
    pub days: u32,
}

/// Sentinel the admin form sends for "no time restriction".
pub const ANY_TIME: &str = "any";

impl TimeFilter {
    /// Parse the admin form's `timeFilter` value.
    ///
    /// `None`, `"any"`, zero, negative numbers and non-integers all mean no
    /// filter.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.trim();
        if raw.is_empty() || raw == ANY_TIME {
            return None;
        }
        raw.parse::<u32>().ok().and_then(Self::from_days)
    }

    /// A filter of `days`, or `None` for zero.
    pub fn from_days(days: u32) -> Option<Self> {
        (days > 0).then_some(TimeFilter { days })
    }

    /// The instant a recipient must have been created strictly before.
    ///
    /// `None` when the day count reaches past the earliest representable
    /// instant.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(Duration::days(i64::from(self.days)))
    }
}
