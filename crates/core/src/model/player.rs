use serde::{Deserialize, Serialize};

use crate::model::ids::PlayerRecordId;

/// A player record as stored by the remote registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlayerRecord {
    pub id: PlayerRecordId,
    pub name: String,
    pub is_complete: bool,
    pub score: u32,
}

/// Body of a registry create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayerRecord {
    pub name: String,
    pub is_complete: bool,
    pub score: u32,
}

impl NewPlayerRecord {
    /// A record announcing that `name` finished the round with `score`.
    #[must_use]
    pub fn completed(name: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            is_complete: true,
            score,
        }
    }
}

/// First record in `records` whose name matches exactly.
#[must_use]
pub fn find_by_name<'a>(records: &'a [RemotePlayerRecord], name: &str) -> Option<&'a RemotePlayerRecord> {
    records.iter().find(|record| record.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_json_maps_to_records() {
        let json = r#"[
            {"id": 3, "name": "ada", "is_complete": false, "score": 4},
            {"id": 9, "name": "grace", "is_complete": true, "score": 12}
        ]"#;
        let records: Vec<RemotePlayerRecord> = serde_json::from_str(json).unwrap();
        let grace = find_by_name(&records, "grace").unwrap();
        assert_eq!(grace.id, PlayerRecordId::new(9));
        assert!(grace.is_complete);
        assert!(find_by_name(&records, "Grace").is_none());
    }

    #[test]
    fn completed_record_serializes_wire_fields() {
        let body = serde_json::to_value(NewPlayerRecord::completed("ada", 10)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"name": "ada", "is_complete": true, "score": 10})
        );
    }
}
