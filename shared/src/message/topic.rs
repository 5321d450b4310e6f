//! Broadcast rooms
//!
//! A [`Topic`] names one logical broadcast group. Delivery is scoped by
//! matching a message's topics against each connection's subscribed rooms;
//! the hub never inspects payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A room key
///
/// Wire format:
/// - `session:{session_id}` — the customer devices at one table
/// - `station:{restaurant_id}:{station}` — one kitchen station's displays
/// - `restaurant:{restaurant_id}` — waiters/managers restaurant-wide
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Topic {
    Session(String),
    Station {
        restaurant_id: String,
        station: String,
    },
    Restaurant(String),
}

impl Topic {
    pub fn session(session_id: impl Into<String>) -> Self {
        Topic::Session(session_id.into())
    }

    pub fn station(restaurant_id: impl Into<String>, station: impl Into<String>) -> Self {
        Topic::Station {
            restaurant_id: restaurant_id.into(),
            station: station.into(),
        }
    }

    pub fn restaurant(restaurant_id: impl Into<String>) -> Self {
        Topic::Restaurant(restaurant_id.into())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Session(id) => write!(f, "session:{id}"),
            Topic::Station {
                restaurant_id,
                station,
            } => write!(f, "station:{restaurant_id}:{station}"),
            Topic::Restaurant(id) => write!(f, "restaurant:{id}"),
        }
    }
}

/// Error for unparseable room keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid room key: {0}")]
pub struct InvalidTopic(pub String);

impl FromStr for Topic {
    type Err = InvalidTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("session", id)) if !id.is_empty() => Ok(Topic::Session(id.to_string())),
            Some(("restaurant", id)) if !id.is_empty() => Ok(Topic::Restaurant(id.to_string())),
            Some(("station", rest)) => match rest.split_once(':') {
                Some((restaurant_id, station)) if !restaurant_id.is_empty() && !station.is_empty() => {
                    Ok(Topic::Station {
                        restaurant_id: restaurant_id.to_string(),
                        station: station.to_string(),
                    })
                }
                _ => Err(InvalidTopic(s.to_string())),
            },
            _ => Err(InvalidTopic(s.to_string())),
        }
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.to_string()
    }
}

impl TryFrom<String> for Topic {
    type Error = InvalidTopic;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for topic in [
            Topic::session("abc"),
            Topic::station("r1", "grill"),
            Topic::restaurant("r1"),
        ] {
            let s = topic.to_string();
            assert_eq!(s.parse::<Topic>().unwrap(), topic);
        }
    }

    #[test]
    fn station_keeps_both_parts() {
        let t: Topic = "station:r1:tandoor".parse().unwrap();
        assert_eq!(t, Topic::station("r1", "tandoor"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("".parse::<Topic>().is_err());
        assert!("session:".parse::<Topic>().is_err());
        assert!("station:r1".parse::<Topic>().is_err());
        assert!("zone:r1".parse::<Topic>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&Topic::station("r1", "grill")).unwrap();
        assert_eq!(json, "\"station:r1:grill\"");
        let back: Topic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Topic::station("r1", "grill"));
    }
}
