//! devcost library
//!
//! Read-only HTTP query layer over AWS billing and resource-inventory APIs:
//! unused-resource detection, tag-cost aggregation, and resource-by-tag
//! lookup.

pub mod api;
pub mod aws;
pub mod cache;
pub mod checkers;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{DevcostError, Result};
pub use models::{ProjectCost, Resource, TagCost, UnusedResource};
