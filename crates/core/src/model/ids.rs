use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier the remote player registry assigns to a player record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRecordId(u64);

impl PlayerRecordId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PlayerRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerRecordId({})", self.0)
    }
}

impl fmt::Display for PlayerRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an id from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for PlayerRecordId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(PlayerRecordId::new)
            .map_err(|_| ParseIdError {
                kind: "PlayerRecordId",
            })
    }
}

// ─── Tree node ids ─────────────────────────────────────────────────────────────

/// Identifier of a decision-tree node.
///
/// The synthetic root is `"root"`, its children are `"1"` to `"4"`, and every
/// deeper node is `"{parent}-{index}"` with a zero-based option index.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub const ROOT: &'static str = "root";

    #[must_use]
    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    /// Builds an id from raw text. Returns `None` for empty text or text
    /// containing the path separator.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains(',') {
            return None;
        }
        Some(Self(raw))
    }

    /// Id of the child at `index` (zero-based) under this node.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        if self.is_root() {
            Self((index + 1).to_string())
        } else {
            Self(format!("{}-{index}", self.0))
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeId::new(s).ok_or(ParseIdError { kind: "NodeId" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_record_id_parses_and_displays() {
        let id: PlayerRecordId = "17".parse().unwrap();
        assert_eq!(id, PlayerRecordId::new(17));
        assert_eq!(id.to_string(), "17");
        assert!("seventeen".parse::<PlayerRecordId>().is_err());
    }

    #[test]
    fn root_children_use_one_based_ids() {
        let root = NodeId::root();
        assert_eq!(root.child(0).as_str(), "1");
        assert_eq!(root.child(3).as_str(), "4");
    }

    #[test]
    fn nested_children_append_zero_based_index() {
        let node: NodeId = "2".parse().unwrap();
        assert_eq!(node.child(0).as_str(), "2-0");
        assert_eq!(node.child(3).child(1).as_str(), "2-3-1");
    }

    #[test]
    fn node_id_rejects_empty_and_separator() {
        assert!("".parse::<NodeId>().is_err());
        assert!("1,2".parse::<NodeId>().is_err());
    }
}
