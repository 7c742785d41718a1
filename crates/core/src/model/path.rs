use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathParseError {
    #[error("selected path is empty")]
    Empty,

    #[error("selected path must start at root, found {0:?}")]
    MissingRoot(String),

    #[error("invalid node id in selected path: {0:?}")]
    InvalidId(String),
}

/// Node ids from the root to the player's current position.
///
/// Always starts with `root`; grows by one id per recorded answer and never shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPath(Vec<NodeId>);

impl SelectedPath {
    /// A path that has not left the root yet.
    #[must_use]
    pub fn root() -> Self {
        Self(vec![NodeId::root()])
    }

    /// Build a path from ids.
    ///
    /// # Errors
    ///
    /// Returns `PathParseError` if `ids` is empty, does not begin at the root,
    /// or repeats the root further down.
    pub fn from_ids(ids: Vec<NodeId>) -> Result<Self, PathParseError> {
        let Some(first) = ids.first() else {
            return Err(PathParseError::Empty);
        };
        if !first.is_root() {
            return Err(PathParseError::MissingRoot(first.to_string()));
        }
        if let Some(stray) = ids.iter().skip(1).find(|id| id.is_root()) {
            return Err(PathParseError::InvalidId(stray.to_string()));
        }
        Ok(Self(ids))
    }

    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    /// Id of the node the player currently stands on.
    #[must_use]
    pub fn current(&self) -> &NodeId {
        // Construction guarantees at least the root.
        &self.0[self.0.len() - 1]
    }

    /// Number of answers recorded along this path.
    #[must_use]
    pub fn answered(&self) -> usize {
        self.0.len() - 1
    }

    /// A copy of this path with `id` appended.
    #[must_use]
    pub fn extended(&self, id: NodeId) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend(self.0.iter().cloned());
        ids.push(id);
        Self(ids)
    }
}

impl Default for SelectedPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for SelectedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(id.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for SelectedPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PathParseError::Empty);
        }
        let ids = s
            .split(',')
            .map(|raw| {
                NodeId::new(raw.trim()).ok_or_else(|| PathParseError::InvalidId(raw.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_ids(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_round_trips() {
        let path: SelectedPath = "root,3,3-0,3-0-2".parse().unwrap();
        assert_eq!(path.answered(), 3);
        assert_eq!(path.current().as_str(), "3-0-2");
        assert_eq!(path.to_string(), "root,3,3-0,3-0-2");
    }

    #[test]
    fn rejects_paths_not_starting_at_root() {
        assert_eq!(
            "1,1-0".parse::<SelectedPath>().unwrap_err(),
            PathParseError::MissingRoot("1".into())
        );
        assert_eq!("".parse::<SelectedPath>().unwrap_err(), PathParseError::Empty);
        assert!("root,,1".parse::<SelectedPath>().is_err());
        assert!("root,1,root".parse::<SelectedPath>().is_err());
    }

    #[test]
    fn extended_leaves_original_untouched() {
        let root = SelectedPath::root();
        let next = root.extended(NodeId::root().child(1));
        assert_eq!(root.answered(), 0);
        assert_eq!(next.answered(), 1);
        assert_eq!(next.current().as_str(), "2");
    }
}
