use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Custom deserializer for Duration from milliseconds
pub fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Custom deserializer for Duration from seconds
pub fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// Custom serializer for Duration to milliseconds
pub fn serialize_duration_to_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Custom serializer for Duration to seconds
pub fn serialize_duration_to_seconds<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct PollingSettings {
        #[serde(
            deserialize_with = "deserialize_duration_from_ms",
            serialize_with = "serialize_duration_to_ms"
        )]
        polling_interval_ms: Duration,
        #[serde(
            deserialize_with = "deserialize_duration_from_seconds",
            serialize_with = "serialize_duration_to_seconds"
        )]
        update_interval_secs: Duration,
    }

    #[test]
    fn test_deserialize_mixed_units() {
        let json = r#"{"polling_interval_ms": 500, "update_interval_secs": 5}"#;
        let actual: PollingSettings = serde_json::from_str(json).unwrap();
        assert_eq!(actual.polling_interval_ms, Duration::from_millis(500));
        assert_eq!(actual.update_interval_secs, Duration::from_secs(5));
    }

    #[test]
    fn test_serialize_mixed_units() {
        let settings = PollingSettings {
            polling_interval_ms: Duration::from_millis(2000),
            update_interval_secs: Duration::from_secs(30),
        };
        let actual = serde_json::to_string(&settings).unwrap();
        assert_eq!(actual, r#"{"polling_interval_ms":2000,"update_interval_secs":30}"#);
    }

    #[test]
    fn test_deserialize_rejects_negative_values() {
        let json = r#"{"polling_interval_ms": -1, "update_interval_secs": 5}"#;
        let result: Result<PollingSettings, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
