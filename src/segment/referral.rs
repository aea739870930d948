// Referral exclusion — who has never successfully referred anyone.
//
// A referral "succeeded" when some other waitlist row carries the referrer's
// referral_id in its referred_by column. The calculation is an anti-join
// done in two explicit steps: collect the referenced ids, then drop every
// recipient whose own referral_id is in that set.

use std::collections::HashSet;

use crate::db::models::Recipient;

/// The set of referral ids that were used by at least one signup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessfulReferrers {
    ids: HashSet<String>,
}

impl SuccessfulReferrers {
    /// Build the set from `referred_by` values. Duplicates collapse.
    pub fn from_references<I, S>(references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: references.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the set by scanning recipients' `referred_by` fields.
    pub fn from_registry(all: &[Recipient]) -> Self {
        Self::from_references(all.iter().filter_map(|r| r.referred_by.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when this recipient referred somebody. A recipient with no
    /// referral_id can't have.
    pub fn contains(&self, recipient: &Recipient) -> bool {
        recipient
            .referral_id
            .as_ref()
            .is_some_and(|id| self.ids.contains(id))
    }

    /// The ids as a sorted list, for pushing into a registry not-in filter.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

/// Keep only the recipients who have not referred anyone, preserving order.
///
/// In-memory form of the anti-join. The resolver pushes the same filter
/// down into the registry query instead; its tests compare the two.
///
/// `all` is the entire registry: references are collected from it before
/// any filtering. When nobody has referred anyone, everyone passes.
pub fn exclude_successful_referrers(all: &[Recipient]) -> Vec<Recipient> {
    let referrers = SuccessfulReferrers::from_registry(all);
    all.iter()
        .filter(|r| !referrers.contains(r))
        .cloned()
        .collect()
}
