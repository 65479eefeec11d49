//! Isolated per-variant content documents.

use serde_json::{Map, Value, json};
use variantscope_shared::VariantInfo;

/// Build a copy of `content_item` scoped to one variant.
///
/// `data.blocks` is replaced by the variant's blocks (other `data` fields
/// are kept) and `meta.variantMetadata` records where the copy came from
/// (other `meta` fields are kept). The input is never modified.
pub fn create_variant_content(
    content_item: &Value,
    variant_index: usize,
    variant: &VariantInfo,
) -> Value {
    let mut item = object_or_empty(Some(content_item));

    let mut data = object_or_empty(content_item.get("data"));
    data.insert("blocks".into(), Value::Array(variant.blocks.clone()));

    let mut variant_metadata = Map::new();
    if let Some(id) = content_item.get("id") {
        variant_metadata.insert("originalContentId".into(), id.clone());
    }
    variant_metadata.insert("variantIndex".into(), json!(variant_index));
    if let Some(name) = &variant.name {
        variant_metadata.insert("variantName".into(), json!(name));
    }
    variant_metadata.insert("targetLocales".into(), json!(variant.target_locales));

    let mut meta = object_or_empty(content_item.get("meta"));
    meta.insert("variantMetadata".into(), Value::Object(variant_metadata));

    item.insert("data".into(), Value::Object(data));
    item.insert("meta".into(), Value::Object(meta));
    Value::Object(item)
}

/// Clone the fields of an object; anything else spreads to nothing.
fn object_or_empty(value: Option<&Value>) -> Map<String, Value> {
    value
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
