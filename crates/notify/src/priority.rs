//! Delivery priority levels

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::NotifyError;

/// Five-level priority handed to the delivery collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Min = 1,
    Low = 2,
    #[default]
    Default = 3,
    High = 4,
    Max = 5,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Max => "max",
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    fn from_level(level: u64) -> Option<Self> {
        match level {
            1 => Some(Priority::Min),
            2 => Some(Priority::Low),
            3 => Some(Priority::Default),
            4 => Some(Priority::High),
            5 => Some(Priority::Max),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let priority = match normalized.as_str() {
            "min" => Priority::Min,
            "low" => Priority::Low,
            "default" => Priority::Default,
            "high" => Priority::High,
            "max" | "urgent" => Priority::Max,
            other => other
                .parse::<u64>()
                .ok()
                .and_then(Priority::from_level)
                .ok_or_else(|| NotifyError::InvalidPriority(s.to_string()))?,
        };
        Ok(priority)
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct PriorityVisitor;

impl Visitor<'_> for PriorityVisitor {
    type Value = Priority;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a priority name (min, low, default, high, max, urgent) or level 1-5")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Priority, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Priority, E> {
        Priority::from_level(v).ok_or_else(|| E::custom(NotifyError::InvalidPriority(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Priority, E> {
        u64::try_from(v)
            .ok()
            .and_then(Priority::from_level)
            .ok_or_else(|| E::custom(NotifyError::InvalidPriority(v.to_string())))
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriorityVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_levels() {
        assert_eq!("min".parse::<Priority>().unwrap(), Priority::Min);
        assert_eq!("LOW".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("Default".parse::<Priority>().unwrap(), Priority::Default);
        assert_eq!("4".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("max".parse::<Priority>().unwrap(), Priority::Max);
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Max);
        assert_eq!("5".parse::<Priority>().unwrap(), Priority::Max);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("0".parse::<Priority>().is_err());
        assert!("6".parse::<Priority>().is_err());
        assert!("loud".parse::<Priority>().is_err());
        assert!("".parse::<Priority>().is_err());
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::from_str::<Priority>("\"urgent\"").unwrap(), Priority::Max);
        assert_eq!(serde_json::from_str::<Priority>("2").unwrap(), Priority::Low);
        assert!(serde_json::from_str::<Priority>("9").is_err());
        assert!(serde_json::from_str::<Priority>("\"nope\"").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Priority::Max > Priority::High);
        assert_eq!(Priority::default().level(), 3);
    }
}
