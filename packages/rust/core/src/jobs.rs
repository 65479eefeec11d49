//! Per-variant job planning.
//!
//! Turns detected containers into the descriptors a job-submission
//! consumer needs: a stable job name, the locales to translate into, and
//! the isolated content payload.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use variantscope_shared::PersonalizationContainer;

use crate::job_name::generate_variant_job_name;
use crate::variant_content::create_variant_content;

/// One translation job for one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantJob {
    pub job_name: String,
    pub container_block_id: String,
    pub variant_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    pub target_locales: Vec<String>,
    /// `content_item` scoped to this variant's blocks.
    pub content: Value,
}

/// Plan one job per variant across `containers`, in discovery order.
///
/// Variants without target locales are still planned; the consumer decides
/// whether to submit them.
pub fn plan_variant_jobs(
    content_item: &Value,
    containers: &[PersonalizationContainer],
) -> Vec<VariantJob> {
    let content_id = content_item
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let jobs: Vec<VariantJob> = containers
        .iter()
        .flat_map(|container| {
            container.variants.iter().map(move |variant| VariantJob {
                job_name: generate_variant_job_name(
                    content_id,
                    variant.name.as_deref(),
                    Some(variant.index),
                ),
                container_block_id: container.container_block_id.clone(),
                variant_index: variant.index,
                variant_name: variant.name.clone(),
                target_locales: variant.target_locales.clone(),
                content: create_variant_content(content_item, variant.index, variant),
            })
        })
        .collect();

    debug!(content_id, jobs = jobs.len(), "planned variant jobs");
    jobs
}
