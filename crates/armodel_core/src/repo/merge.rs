//! Null-aware record overlay used by partial updates.

use super::{RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Copies every non-null top-level field of `incoming` onto `stored`.
///
/// The overlay is shallow: a non-null nested object replaces the stored one
/// wholesale. Both records must serialize as JSON objects.
pub fn merge_non_null<E>(stored: &E, incoming: &E) -> RepoResult<E>
where
    E: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(stored)?;
    let overlay = serde_json::to_value(incoming)?;

    match (&mut base, overlay) {
        (Value::Object(base_fields), Value::Object(overlay_fields)) => {
            for (field, value) in overlay_fields {
                if !value.is_null() {
                    base_fields.insert(field, value);
                }
            }
        }
        _ => {
            return Err(RepoError::InvalidData(
                "partial updates require records that serialize as objects".to_string(),
            ));
        }
    }

    Ok(serde_json::from_value(base)?)
}
