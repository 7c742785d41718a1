//! Key-value encoding of a session, shared by every store backend.
//!
//! Values are string-encoded scalars under fixed keys so a store written by one
//! backend reads the same through another.

use std::collections::HashMap;

use round_core::model::{SelectedPath, SessionDraft};
use round_core::time::{from_unix_millis, to_unix_millis};

use crate::repository::StorageError;

/// Keys of the progress store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressKey {
    UserScore,
    StartTime,
    CurrentQuestionIndex,
    Submitted,
    IsDone,
    Name,
    SelectedPath,
}

impl ProgressKey {
    pub const ALL: [ProgressKey; 7] = [
        ProgressKey::UserScore,
        ProgressKey::StartTime,
        ProgressKey::CurrentQuestionIndex,
        ProgressKey::Submitted,
        ProgressKey::IsDone,
        ProgressKey::Name,
        ProgressKey::SelectedPath,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressKey::UserScore => "user_score",
            ProgressKey::StartTime => "start_time",
            ProgressKey::CurrentQuestionIndex => "current_question_index",
            ProgressKey::Submitted => "submitted",
            ProgressKey::IsDone => "isDone",
            ProgressKey::Name => "name",
            ProgressKey::SelectedPath => "selected_path",
        }
    }
}

/// Flatten a draft into key/value pairs. Fields that are `None` are left out.
#[must_use]
pub fn encode(draft: &SessionDraft) -> Vec<(ProgressKey, String)> {
    let mut entries = Vec::with_capacity(ProgressKey::ALL.len());
    if let Some(name) = &draft.player_name {
        entries.push((ProgressKey::Name, name.clone()));
    }
    if let Some(score) = draft.score {
        entries.push((ProgressKey::UserScore, score.to_string()));
    }
    if let Some(index) = draft.current_question_index {
        entries.push((ProgressKey::CurrentQuestionIndex, index.to_string()));
    }
    if let Some(start) = draft.start_time {
        entries.push((ProgressKey::StartTime, to_unix_millis(start).to_string()));
    }
    if let Some(submitted) = draft.submitted {
        entries.push((ProgressKey::Submitted, submitted.to_string()));
    }
    if let Some(completed) = draft.completed {
        entries.push((ProgressKey::IsDone, completed.to_string()));
    }
    if let Some(path) = &draft.selected_path {
        entries.push((ProgressKey::SelectedPath, path.to_string()));
    }
    entries
}

/// Rebuild a draft from raw entries. Unknown keys are ignored.
///
/// # Errors
///
/// Returns `StorageError::Serialization` when a known key holds a value that
/// does not parse.
pub fn decode(entries: &HashMap<String, String>) -> Result<SessionDraft, StorageError> {
    let get = |key: ProgressKey| entries.get(key.as_str()).map(String::as_str);

    let start_time = get(ProgressKey::StartTime)
        .map(|raw| {
            raw.parse::<i64>()
                .ok()
                .and_then(from_unix_millis)
                .ok_or_else(|| invalid(ProgressKey::StartTime, raw))
        })
        .transpose()?;

    let selected_path = get(ProgressKey::SelectedPath)
        .map(|raw| {
            raw.parse::<SelectedPath>()
                .map_err(|err| StorageError::Serialization(err.to_string()))
        })
        .transpose()?;

    Ok(SessionDraft {
        player_name: get(ProgressKey::Name).map(str::to_owned),
        score: parse_u32(ProgressKey::UserScore, get(ProgressKey::UserScore))?,
        current_question_index: parse_u32(
            ProgressKey::CurrentQuestionIndex,
            get(ProgressKey::CurrentQuestionIndex),
        )?,
        start_time,
        submitted: parse_flag(ProgressKey::Submitted, get(ProgressKey::Submitted))?,
        completed: parse_flag(ProgressKey::IsDone, get(ProgressKey::IsDone))?,
        selected_path,
    })
}

fn invalid(key: ProgressKey, raw: &str) -> StorageError {
    StorageError::Serialization(format!("invalid {}: {raw:?}", key.as_str()))
}

fn parse_u32(key: ProgressKey, raw: Option<&str>) -> Result<Option<u32>, StorageError> {
    raw.map(|value| value.trim().parse::<u32>().map_err(|_| invalid(key, value)))
        .transpose()
}

fn parse_flag(key: ProgressKey, raw: Option<&str>) -> Result<Option<bool>, StorageError> {
    raw.map(|value| match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value)),
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use round_core::model::SessionState;
    use round_core::time::fixed_now;

    fn to_map(entries: Vec<(ProgressKey, String)>) -> HashMap<String, String> {
        entries
            .into_iter()
            .map(|(key, value)| (key.as_str().to_owned(), value))
            .collect()
    }

    #[test]
    fn encodes_wire_keys_and_scalars() {
        let mut state = SessionState::start(Some("ada".into()), fixed_now());
        state.record_answer("root,3".parse().unwrap(), true);
        let map = to_map(encode(&state.to_draft()));

        assert_eq!(map["name"], "ada");
        assert_eq!(map["user_score"], "1");
        assert_eq!(map["current_question_index"], "0");
        assert_eq!(map["start_time"], "1700000000000");
        assert_eq!(map["submitted"], "false");
        assert_eq!(map["isDone"], "false");
        assert_eq!(map["selected_path"], "root,3");
    }

    #[test]
    fn decode_restores_encoded_state() {
        let mut state = SessionState::start(Some("ada".into()), fixed_now());
        state.record_answer("root,1".parse().unwrap(), false);
        state.advance_question();
        state.mark_submitted();

        let draft = decode(&to_map(encode(&state.to_draft()))).unwrap();
        assert_eq!(SessionState::from_draft(draft, fixed_now()), state);
    }

    #[test]
    fn missing_keys_decode_as_none() {
        let draft = decode(&HashMap::new()).unwrap();
        assert!(draft.is_empty());
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut map = HashMap::new();
        map.insert("user_score".to_owned(), "lots".to_owned());
        assert!(matches!(
            decode(&map),
            Err(StorageError::Serialization(msg)) if msg.contains("user_score")
        ));

        let mut map = HashMap::new();
        map.insert("submitted".to_owned(), "yes".to_owned());
        assert!(decode(&map).is_err());

        let mut map = HashMap::new();
        map.insert("selected_path".to_owned(), "1,1-0".to_owned());
        assert!(decode(&map).is_err());
    }
}
