//! Partial-update helpers
//!
//! Nullable columns are patched through `Option<Option<T>>`: the outer `None`
//! means the field was absent from the request body and must be left alone,
//! `Some(None)` means an explicit JSON `null` that clears the column.
//! Diesel's `AsChangeset` derive understands the same encoding.

use serde::{Deserialize, Deserializer};

/// Deserialize a present field into `Some(..)`, keeping `null` as `Some(None)`
///
/// Must be paired with `#[serde(default)]` so that an absent field stays `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        sector: Option<Option<String>>,
    }

    #[test]
    fn test_absent_field_is_none() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.sector, None);
    }

    #[test]
    fn test_null_field_is_some_none() {
        let patch: Patch = serde_json::from_str(r#"{"sector": null}"#).unwrap();
        assert_eq!(patch.sector, Some(None));
    }

    #[test]
    fn test_value_field_is_some_some() {
        let patch: Patch = serde_json::from_str(r#"{"sector": "Energy"}"#).unwrap();
        assert_eq!(patch.sector, Some(Some("Energy".to_string())));
    }
}
