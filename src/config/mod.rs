//! Crawl configuration
//!
//! `CrawlConfig` with its typestate builder, JSON loading and validation.

pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

pub use builder::{CrawlConfigBuilder, WithStorageDir};
pub use types::{ConfigError, CrawlConfig};
