//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use article_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Politeness delay: {:?}", config.crawl.delay());
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlConfig, SourceEntry, StoreConfig};

pub use parser::{load_config, parse_config};
