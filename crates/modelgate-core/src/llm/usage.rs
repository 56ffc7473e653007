//! Token usage extraction from raw provider responses.

use serde_json::Value;

use modelgate_types::llm::UsageRecord;

/// Read `usage.{prompt,completion,total}_tokens` from a response body.
///
/// Missing or non-numeric counters are zero, and a response without a
/// usage object yields an all-zero record. Totals are taken as reported,
/// never recomputed.
pub fn extract_usage(raw: &Value) -> UsageRecord {
    let Some(usage) = raw.get("usage").filter(|u| u.is_object()) else {
        return UsageRecord::default();
    };

    let counter = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);

    UsageRecord {
        prompt_tokens: counter("prompt_tokens"),
        completion_tokens: counter("completion_tokens"),
        total_tokens: counter("total_tokens"),
    }
}
