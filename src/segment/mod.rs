// Audience selection — turns a target group and a recency cutoff into a
// concrete list of recipients.

pub mod filter;
pub mod referral;
pub mod resolver;

pub use filter::{SegmentFilter, TimeFilter};
