//! Core domain types: content references, query conditions, variants and
//! personalization containers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Model used when a content reference names neither `modelName` nor `modelId`.
pub const DEFAULT_MODEL: &str = "page";

/// Component name that marks a block as a personalization container.
pub const PERSONALIZATION_CONTAINER: &str = "PersonalizationContainer";

// ---------------------------------------------------------------------------
// ContentRef
// ---------------------------------------------------------------------------

/// Identifies a content document on the content API.
///
/// Accepts the loose shape callers pass around (`id` plus either `modelName`
/// or `modelId`) and resolves it once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
    /// Content entry identifier.
    pub id: String,
    /// Model name, preferred when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Model identifier, used when `model_name` is absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl ContentRef {
    /// Reference a content entry of the default model.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model_name: None,
            model_id: None,
        }
    }

    /// Set the model name.
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Set the model identifier.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Resolve the model: `model_name`, then `model_id`, then [`DEFAULT_MODEL`].
    /// Empty strings count as absent.
    pub fn model(&self) -> &str {
        [self.model_name.as_deref(), self.model_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }
}

// ---------------------------------------------------------------------------
// Query conditions
// ---------------------------------------------------------------------------

/// Comparison operator of a targeting condition. Carried, never evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryOperator {
    Is,
    IsNot,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    /// Any operator string this crate does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Right-hand side of a targeting condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<QueryValue>),
    /// `null`, objects, or anything else the editor stored.
    Other(Value),
}

impl Default for QueryValue {
    fn default() -> Self {
        Self::Other(Value::Null)
    }
}

impl QueryValue {
    /// The string payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A single targeting rule attached to a variant.
///
/// Decoding never rejects an object on account of its `property` or
/// `operator`: a non-string property reads as empty and an operator of any
/// unexpected shape reads as [`QueryOperator::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    #[serde(default, deserialize_with = "lenient_property")]
    pub property: String,
    #[serde(default, deserialize_with = "lenient_operator")]
    pub operator: QueryOperator,
    #[serde(default)]
    pub value: QueryValue,
}

fn lenient_property<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().map(str::to_string).unwrap_or_default())
}

fn lenient_operator<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<QueryOperator, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(QueryOperator::deserialize(raw).unwrap_or_default())
}

impl QueryCondition {
    pub fn new(
        property: impl Into<String>,
        operator: QueryOperator,
        value: impl Into<QueryValue>,
    ) -> Self {
        Self {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Variants and containers
// ---------------------------------------------------------------------------

/// One declared variant of a personalization container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    /// Position in the container's declaration order, starting at 0.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub query: Vec<QueryCondition>,
    /// The variant's own block subtree, kept verbatim.
    #[serde(default)]
    pub blocks: Vec<Value>,
    /// Locales named by `query`, duplicate-free in first-seen order.
    #[serde(default)]
    pub target_locales: Vec<String>,
}

/// A `PersonalizationContainer` block found in a content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationContainer {
    pub container_block_id: String,
    pub variants: Vec<VariantInfo>,
}
