// Megaphone: segmented broadcast email for the getstuff.city waitlist
//
// This is the library root. Each module corresponds to one stage of the
// broadcast flow, from audience selection through delivery.

pub mod broadcast;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod segment;
pub mod status;

#[cfg(feature = "web")]
pub mod web;
