//! Personalization container detection.
//!
//! Fetches a content document, normalizes its `data.blocks` (which the API
//! may return as a JSON-encoded string) and walks the block tree to find
//! `PersonalizationContainer` components. Detection is best-effort: every
//! failure is logged and degrades to "no containers".

use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};
use variantscope_content::ContentClient;
use variantscope_shared::{
    ContentApiConfig, ContentRef, PERSONALIZATION_CONTAINER, PersonalizationContainer, Result,
    VariantInfo, VariantScopeError,
};

use crate::locale::{extract_target_locales, json_kind, parse_query};

// ---------------------------------------------------------------------------
// Detection outcome
// ---------------------------------------------------------------------------

/// Outcome of a detection run.
///
/// Callers that only care about containers use
/// [`ContainerDetector::detect_personalization_containers`], which folds the
/// failure cases into an empty list.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// The document was fetched and walked; the list may be empty.
    Found(Vec<PersonalizationContainer>),
    /// The content API could not be reached or refused the request.
    FetchFailed {
        reason: String,
        /// Whether retrying the same request later might succeed.
        transient: bool,
    },
    /// The document arrived but its blocks could not be interpreted.
    ParseFailed { reason: String },
}

impl Detection {
    /// Containers found, or an empty slice for failed runs.
    pub fn containers(&self) -> &[PersonalizationContainer] {
        match self {
            Self::Found(containers) => containers,
            _ => &[],
        }
    }

    /// Consume into the container list, failures becoming empty.
    pub fn into_containers(self) -> Vec<PersonalizationContainer> {
        match self {
            Self::Found(containers) => containers,
            _ => Vec::new(),
        }
    }

    /// Whether the run failed, as opposed to finding nothing.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Found(_))
    }
}

// ---------------------------------------------------------------------------
// ContainerDetector
// ---------------------------------------------------------------------------

/// Finds personalization containers in content documents served by the
/// content API. Holds no per-call state, so one detector can serve many
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct ContainerDetector {
    client: ContentClient,
}

impl ContainerDetector {
    pub fn new(client: ContentClient) -> Self {
        Self { client }
    }

    /// Build a detector from the `[content_api]` config section.
    pub fn from_config(config: &ContentApiConfig) -> Result<Self> {
        Ok(Self::new(ContentClient::from_config(config)?))
    }

    /// The underlying content API client.
    pub fn client(&self) -> &ContentClient {
        &self.client
    }

    /// Fetch `content` and report what was found, keeping failures distinct
    /// from legitimate absence.
    #[instrument(skip_all, fields(model = %content.model(), id = %content.id))]
    pub async fn detect(&self, content: &ContentRef, api_key: &str) -> Detection {
        let document = match self.client.fetch_content(content, api_key).await {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "failed to fetch content for container detection");
                return Detection::FetchFailed {
                    transient: e.is_transient(),
                    reason: e.to_string(),
                };
            }
        };

        let detection = inspect_document(&document);
        if let Detection::Found(containers) = &detection {
            info!(containers = containers.len(), "container detection complete");
        }
        detection
    }

    /// Fetch `content` and return its personalization containers in
    /// discovery order. Never fails: fetch and parse problems yield an
    /// empty list.
    pub async fn detect_personalization_containers(
        &self,
        content: &ContentRef,
        api_key: &str,
    ) -> Vec<PersonalizationContainer> {
        self.detect(content, api_key).await.into_containers()
    }

    /// Whether `content` has at least one personalization container.
    /// Performs a full fetch and walk on every call.
    pub async fn has_personalization_containers(&self, content: &ContentRef, api_key: &str) -> bool {
        !self
            .detect_personalization_containers(content, api_key)
            .await
            .is_empty()
    }
}

// ---------------------------------------------------------------------------
// Document inspection (no I/O)
// ---------------------------------------------------------------------------

/// Normalize and walk an already-fetched content document.
pub fn inspect_document(document: &Value) -> Detection {
    match normalize_blocks(document) {
        Ok(blocks) => Detection::Found(find_personalization_containers(&blocks)),
        Err(e) => {
            warn!(error = %e, "content blocks could not be interpreted");
            Detection::ParseFailed {
                reason: e.to_string(),
            }
        }
    }
}

/// Extract `data.blocks` from a content document as a block list.
///
/// A string value is decoded as JSON first. Missing or `null` blocks mean an
/// empty page; any other non-array shape is an error.
pub fn normalize_blocks(document: &Value) -> Result<Vec<Value>> {
    let raw = document.get("data").and_then(|data| data.get("blocks"));

    let decoded;
    let blocks = match raw {
        None | Some(Value::Null) => {
            debug!("document has no blocks");
            return Ok(Vec::new());
        }
        Some(Value::String(encoded)) => {
            decoded = serde_json::from_str::<Value>(encoded).map_err(|e| {
                VariantScopeError::parse(format!("failed to parse string-encoded blocks: {e}"))
            })?;
            &decoded
        }
        Some(value) => value,
    };

    match blocks {
        Value::Array(items) => Ok(items.clone()),
        other => Err(VariantScopeError::validation(format!(
            "expected blocks to be an array, found {}",
            json_kind(other)
        ))),
    }
}

/// Walk `blocks` depth-first in pre-order and collect every
/// personalization container, nested ones included.
///
/// Uses an explicit stack, so deeply nested documents cannot exhaust the
/// thread stack.
pub fn find_personalization_containers(blocks: &[Value]) -> Vec<PersonalizationContainer> {
    let mut containers = Vec::new();
    let mut stack: Vec<&Value> = blocks.iter().rev().collect();

    while let Some(block) = stack.pop() {
        if let Some(container) = container_from_block(block) {
            debug!(
                container_block_id = %container.container_block_id,
                variants = container.variants.len(),
                "found personalization container"
            );
            containers.push(container);
        }

        if let Some(children) = block.get("children").and_then(Value::as_array) {
            stack.extend(children.iter().rev());
        }
    }

    containers
}

/// Build a container descriptor if `block` is a personalization container
/// declaring at least one variant.
fn container_from_block(block: &Value) -> Option<PersonalizationContainer> {
    let component = block.get("component")?;
    if component.get("name").and_then(Value::as_str) != Some(PERSONALIZATION_CONTAINER) {
        return None;
    }

    let declared = component
        .get("options")
        .and_then(|options| options.get("variants"))
        .and_then(Value::as_array)
        .filter(|variants| !variants.is_empty());
    let Some(declared) = declared else {
        trace!("personalization container without variants, skipping");
        return None;
    };

    let variants = declared
        .iter()
        .enumerate()
        .map(|(index, variant)| variant_from_value(index, variant))
        .collect();

    Some(PersonalizationContainer {
        container_block_id: block_id(block),
        variants,
    })
}

fn variant_from_value(index: usize, variant: &Value) -> VariantInfo {
    let query = parse_query(variant.get("query").unwrap_or(&Value::Null));
    let target_locales = extract_target_locales(&query);

    VariantInfo {
        index,
        name: variant
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        query,
        blocks: variant
            .get("blocks")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        target_locales,
    }
}

fn block_id(block: &Value) -> String {
    match block.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    }
}
