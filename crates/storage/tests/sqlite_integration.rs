use chrono::Duration;
use round_core::model::{SessionDraft, SessionState};
use round_core::time::fixed_now;
use storage::repository::{SessionStore, Storage};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_restores_session() {
    let repo = connect("memdb_progress_roundtrip").await;

    let mut state = SessionState::start(Some("ada".into()), fixed_now());
    state.record_answer("root,2".parse().unwrap(), true);
    state.advance_question();
    state.record_answer("root,2,2-3".parse().unwrap(), false);
    repo.save(&state.to_draft()).await.unwrap();

    let draft = repo.load().await.unwrap();
    let restored = SessionState::from_draft(draft, fixed_now() + Duration::hours(1));
    assert_eq!(restored.player_name(), Some("ada"));
    assert_eq!(restored.score(), 1);
    assert_eq!(restored.current_question_index(), 2);
    assert_eq!(restored.start_time(), fixed_now());
    assert_eq!(restored.selected_path().to_string(), "root,2,2-3");
}

#[tokio::test]
async fn sqlite_save_overwrites_existing_keys() {
    let repo = connect("memdb_progress_overwrite").await;

    let mut state = SessionState::start(Some("grace".into()), fixed_now());
    repo.save(&state.to_draft()).await.unwrap();
    state.record_answer("root,1".parse().unwrap(), true);
    state.mark_submitted();
    state.set_completed(true);
    repo.save(&state.to_draft()).await.unwrap();

    let draft = repo.load().await.unwrap();
    assert_eq!(draft.score, Some(1));
    assert_eq!(draft.submitted, Some(true));
    assert_eq!(draft.completed, Some(true));
}

#[tokio::test]
async fn sqlite_clear_empties_store() {
    let repo = connect("memdb_progress_clear").await;
    repo.save(&SessionDraft {
        player_name: Some("linus".into()),
        ..SessionDraft::default()
    })
    .await
    .unwrap();

    repo.clear().await.unwrap();
    assert!(repo.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_progress_migrate").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_exposes_session_store() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    assert!(storage.sessions.load().await.unwrap().is_empty());
}
