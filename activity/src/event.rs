use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload pushed to live observers for each accepted, newly-logged match.
///
/// Derived from the persisted match record plus the recognizing actor's
/// display name. Transient: never stored, only broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Stable identifier of the matched identity.
    pub identity_id: String,
    /// Display name of the matched identity.
    pub identity_name: String,
    /// Facility the identity is enrolled at, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    /// Display name of the actor whose recognition produced the match.
    pub actor_name: String,
    /// Reported confidence in [0, 1].
    pub score: f32,
    /// Accepting metric: `"cosine"` or `"euclidean"`.
    pub method: String,
    /// When the match was accepted.
    pub recognized_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ActivityEvent {
        ActivityEvent {
            identity_id: "id-042".into(),
            identity_name: "Jane Roe".into(),
            facility: None,
            actor_name: "desk-3".into(),
            score: 0.91,
            method: "cosine".into(),
            recognized_at: Utc::now(),
        }
    }

    #[test]
    fn serializes_without_empty_facility() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["identity_id"], "id-042");
        assert_eq!(json["method"], "cosine");
        assert!(json.get("facility").is_none());
    }

    #[test]
    fn serializes_facility_when_present() {
        let mut ev = sample();
        ev.facility = Some("north-wing".into());
        let json = serde_json::to_value(ev).unwrap();
        assert_eq!(json["facility"], "north-wing");
    }
}
