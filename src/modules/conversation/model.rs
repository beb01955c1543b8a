use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Deterministic conversation id for an unordered pair of users: sort the
/// two ids, join with `_`. Pure function, no storage involved.
pub fn conversation_key(a: &Uuid, b: &Uuid) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", lo, hi)
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
    pub peer_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub conversation_id: String,
}
