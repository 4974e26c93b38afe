//! Deserializers for query strings, where absent and empty values look alike.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Accepts `true`/`false`/`1`/`0` (any case) and treats `""` as absent.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean: {}",
            other
        ))),
    }
}

/// Treats `""` as absent for free-text filters like `?search=`.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        course_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        is_published: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        search: Option<String>,
    }

    #[test]
    fn empty_values_are_none() {
        let f: Filters =
            serde_json::from_str(r#"{"course_id":"","is_published":"","search":"  "}"#).unwrap();
        assert!(f.course_id.is_none());
        assert!(f.is_published.is_none());
        assert!(f.search.is_none());
    }

    #[test]
    fn parses_present_values() {
        let f: Filters = serde_json::from_str(
            r#"{"course_id":"12345678-1234-1234-1234-123456789abc","is_published":"True","search":"rust"}"#,
        )
        .unwrap();
        assert!(f.course_id.is_some());
        assert_eq!(f.is_published, Some(true));
        assert_eq!(f.search.as_deref(), Some("rust"));
    }

    #[test]
    fn rejects_garbage_bool() {
        let res: Result<Filters, _> = serde_json::from_str(r#"{"is_published":"maybe"}"#);
        assert!(res.is_err());
    }
}
