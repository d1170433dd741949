//! Input validation shared by request payloads and the approval service.

pub mod rules;

pub use validator::Validate;
