pub mod broadcast;

pub use broadcast::{run, BroadcastOutcome};
