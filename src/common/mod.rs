// Common utilities and shared types used across the crawler

pub mod constants;
pub mod error;
pub mod types;
