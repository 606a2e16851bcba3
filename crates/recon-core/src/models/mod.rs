//! Data models shared by the extraction pipeline and the matcher.

pub mod config;
pub mod document;
pub mod invoice;
