//! Data models for the ImpactMakers backend.
//!
//! Documents are free-form JSON objects; only the fields the endpoints filter,
//! sort or update on are named here.

mod document;
mod listing;

pub use document::*;
pub use listing::*;
