// Route handlers, one file per API area.

pub mod auth;
pub mod broadcast;
pub mod segment;
