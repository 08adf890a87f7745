//! Shared types, error model, and configuration for DealScout.
//!
//! This crate is the foundation depended on by all other DealScout crates.
//! It provides:
//! - [`DealScoutError`]: the unified error type
//! - Domain types ([`Profile`], [`ProfileHit`], [`BucketTag`], [`ValidationOutcome`])
//! - The profile URL grammar ([`ProfileUrlPattern`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod profile_url;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiKeys, AppConfig, DefaultsConfig, GroundedSearchConfig, KeywordSearchConfig,
    PipelineConfig, ValidationConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_api_keys,
};
pub use error::{DealScoutError, Result};
pub use profile_url::{DEFAULT_PROFILE_HOST, ProfileUrlPattern, canonicalize_profile_url};
pub use types::{
    BucketTag, ContactLink, Profile, ProfileHit, ValidationOutcome, display_name_from_title,
    split_title,
};
