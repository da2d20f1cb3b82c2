//! Serde helpers shared by configuration types

/// Serialize a `Duration` as whole seconds.
///
/// ```ignore
/// #[serde(with = "arena_core::config::serde_utils::duration_secs")]
/// admission_timeout: Duration,
/// ```
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Write the duration as a `u64` number of seconds
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Read a `u64` number of seconds
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Deadline {
        #[serde(with = "duration_secs")]
        after: Duration,
    }

    #[test]
    fn test_duration_as_seconds() {
        let json = serde_json::to_string(&Deadline {
            after: Duration::from_millis(30_900),
        })
        .unwrap();
        // sub-second precision is dropped
        assert_eq!(json, r#"{"after":30}"#);
    }

    #[test]
    fn test_duration_from_toml() {
        let parsed: Deadline = toml::from_str("after = 45").unwrap();
        assert_eq!(parsed.after, Duration::from_secs(45));
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert!(toml::from_str::<Deadline>("after = -1").is_err());
    }
}
