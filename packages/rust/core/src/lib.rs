//! Personalization-variant extraction for VariantScope.
//!
//! This crate finds `PersonalizationContainer` blocks in content documents
//! and derives what per-locale translation jobs need from them:
//! - [`locale`]: target locales from variant query conditions
//! - [`job_name`]: deterministic job names
//! - [`variant_content`]: content copies scoped to one variant
//! - [`detector`]: fetch, normalize and walk a content document
//! - [`jobs`]: one job descriptor per variant

pub mod detector;
pub mod job_name;
pub mod jobs;
pub mod locale;
pub mod variant_content;

pub use detector::{
    ContainerDetector, Detection, find_personalization_containers, inspect_document,
    normalize_blocks,
};
pub use job_name::generate_variant_job_name;
pub use jobs::{VariantJob, plan_variant_jobs};
pub use locale::{extract_target_locales, extract_target_locales_from_value, parse_query};
pub use variant_content::create_variant_content;
