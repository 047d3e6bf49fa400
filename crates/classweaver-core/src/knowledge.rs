//! Knowledge-base list normalization and display helpers.
//!
//! The backend returns knowledge bases as raw records; the client always
//! presents them behind a synthetic "no knowledge base selected" default
//! entry. Normalization de-duplicates by id, coalesces anything that looks
//! like the default onto the default id, and fills display fallbacks so
//! consumers never see a nameless entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::schema::KnowledgeDocumentSummary;

/// Fixed id of the synthetic default entry.
pub const DEFAULT_KNOWLEDGE_BASE_ID: &str = "__default__";

/// Display-oriented knowledge base entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseItem {
    pub id: String,
    pub name: String,
    /// Display-formatted last-update time.
    pub updated: String,
    /// Display-formatted content size.
    pub size: String,
}

/// The synthetic default entry that occupies the first slot of every
/// normalized list. Denotes "no specific collection selected".
pub fn default_knowledge_base() -> KnowledgeBaseItem {
    KnowledgeBaseItem {
        id: DEFAULT_KNOWLEDGE_BASE_ID.to_string(),
        name: "No knowledge base".to_string(),
        updated: "just now".to_string(),
        size: "2.3 MB".to_string(),
    }
}

/// Deterministic fallback display name derived from an id prefix.
fn fallback_name(id: &str) -> String {
    if id.chars().count() > 8 {
        let prefix: String = id.chars().take(6).collect();
        format!("Doc {}", prefix.to_uppercase())
    } else {
        format!("Doc {}", id.to_uppercase())
    }
}

/// Merges a remote list with the synthetic default entry.
///
/// The default is always present exactly once, in the first slot. Iteration
/// keeps the first occurrence of each id and drops later duplicates. An id
/// equal to the default's display name or id is coalesced to the default id,
/// guarding against a backend returning a base literally named like the
/// default. Entries without a usable id are dropped; missing display fields
/// receive fixed fallbacks.
pub fn normalize_knowledge_base_list(list: &[KnowledgeBaseItem]) -> Vec<KnowledgeBaseItem> {
    let default = default_knowledge_base();
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(list.len() + 1);

    for item in std::iter::once(&default).chain(list.iter()) {
        let normalized_id = if item.id == default.name || item.id == default.id {
            default.id.clone()
        } else {
            item.id.trim().to_string()
        };
        if normalized_id.is_empty() || seen.contains(&normalized_id) {
            continue;
        }
        seen.insert(normalized_id.clone());

        if normalized_id == default.id {
            result.push(default.clone());
        } else {
            let name = match item.name.trim() {
                "" => fallback_name(&normalized_id),
                trimmed => trimmed.to_string(),
            };
            result.push(KnowledgeBaseItem {
                id: normalized_id,
                name,
                updated: if item.updated.is_empty() {
                    "just now".to_string()
                } else {
                    item.updated.clone()
                },
                size: if item.size.is_empty() {
                    "-".to_string()
                } else {
                    item.size.clone()
                },
            });
        }
    }

    result
}

/// Looks up a display name by id.
///
/// Falls back to the caller-supplied fallback, then to the truncated-id
/// heuristic used by normalization.
pub fn resolve_knowledge_base_name(
    doc_id: Option<&str>,
    bases: &[KnowledgeBaseItem],
    fallback: Option<&str>,
) -> String {
    let Some(doc_id) = doc_id.filter(|id| !id.is_empty()) else {
        return fallback.unwrap_or("Knowledge base").to_string();
    };
    if let Some(base) = bases.iter().find(|base| base.id == doc_id) {
        return base.name.clone();
    }
    if let Some(fallback) = fallback {
        return fallback.to_string();
    }
    if doc_id.chars().count() > 8 {
        let prefix: String = doc_id.chars().take(6).collect();
        format!("Doc {}", prefix.to_uppercase())
    } else {
        doc_id.to_uppercase()
    }
}

/// Formats a backend timestamp as a coarse relative time for display.
pub fn format_relative_time(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return "just now".to_string();
    };
    let Ok(target) = DateTime::parse_from_rfc3339(value) else {
        return Utc::now().format("%m-%d").to_string();
    };

    let diff = target.with_timezone(&Utc) - Utc::now();
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes.abs() < 1 {
        "just now".to_string()
    } else if hours.abs() < 1 {
        relative_label(minutes, "minute")
    } else if days.abs() < 1 {
        relative_label(hours, "hour")
    } else {
        relative_label(days, "day")
    }
}

fn relative_label(count: i64, unit: &str) -> String {
    let magnitude = count.abs();
    let plural = if magnitude == 1 { "" } else { "s" };
    if count < 0 {
        format!("{magnitude} {unit}{plural} ago")
    } else {
        format!("in {magnitude} {unit}{plural}")
    }
}

/// Formats document metadata as a display size string.
///
/// Prefers an explicit `size_bytes` field, then a `length` character count,
/// then the `-` placeholder.
pub fn format_doc_size(metadata: Option<&serde_json::Value>) -> String {
    let Some(metadata) = metadata else {
        return "-".to_string();
    };
    let bytes = metadata
        .get("size_bytes")
        .and_then(number_field)
        .unwrap_or(0.0);
    if bytes > 0.0 {
        return if bytes >= 1024.0 * 1024.0 {
            format!("{:.1} MB", bytes / 1024.0 / 1024.0)
        } else if bytes >= 1024.0 {
            format!("{} KB", (bytes / 1024.0).round() as i64)
        } else {
            format!("{} B", bytes.round() as i64)
        };
    }
    let length = metadata
        .get("length")
        .and_then(number_field)
        .unwrap_or(0.0);
    if length > 0.0 {
        return format!("{} chars", length.round() as i64);
    }
    "-".to_string()
}

// Backends are inconsistent about numeric vs string-encoded numbers.
fn number_field(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Projects a document summary into a display-oriented knowledge base entry.
pub fn map_document_to_knowledge_base(doc: &KnowledgeDocumentSummary) -> KnowledgeBaseItem {
    KnowledgeBaseItem {
        id: doc.doc_id.clone(),
        name: doc.title.trim().to_string(),
        updated: format_relative_time(Some(doc.updated_at.as_str())),
        size: format_doc_size(doc.metadata.as_ref()),
    }
}
