//! Shared types, error model, and configuration for VariantScope.
//!
//! This crate is the foundation depended on by all other VariantScope crates.
//! It provides:
//! - [`VariantScopeError`]: the unified error type
//! - Domain types ([`ContentRef`], [`QueryCondition`], [`VariantInfo`],
//!   [`PersonalizationContainer`])
//! - Configuration ([`AppConfig`], [`ContentApiConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ContentApiConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_api_key,
};
pub use error::{Result, VariantScopeError};
pub use types::{
    ContentRef, DEFAULT_MODEL, PERSONALIZATION_CONTAINER, PersonalizationContainer,
    QueryCondition, QueryOperator, QueryValue, VariantInfo,
};
