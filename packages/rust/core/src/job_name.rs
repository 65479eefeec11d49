//! Deterministic, API-safe job names for per-variant translation jobs.

use std::sync::LazyLock;

use regex::Regex;

/// Render a job name for one variant of `content_id`.
///
/// A non-blank `variant_name` is slugged (trimmed, lowercased, each run of
/// characters outside `[a-z0-9]` collapsed to `-`, edge hyphens stripped) and
/// appended to the content id. Otherwise the variant index is used; a missing
/// index renders as `undefined`.
pub fn generate_variant_job_name(
    content_id: &str,
    variant_name: Option<&str>,
    variant_index: Option<usize>,
) -> String {
    match variant_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{content_id}-{}", slugify(name)),
        None => {
            let index = variant_index.map_or_else(|| "undefined".to_string(), |i| i.to_string());
            format!("{content_id}-variant-{index}")
        }
    }
}

fn slugify(name: &str) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lowered = name.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
